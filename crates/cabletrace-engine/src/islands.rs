//! Island detector: partition a route's assigned segments into maximal
//! connected components.
//!
//! Only edges whose both ends are assigned to the route count, so two
//! runs joined in the building through containment the cable does not
//! use end up in separate islands.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use petgraph::visit::{Bfs, NodeFiltered};
use serde::{Deserialize, Serialize};

use crate::network::Network;
use crate::types::{BoundingBox, Family, Point3};

/// Containment family of a whole island.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IslandKind {
    /// Every non-fitting member is tray-like.
    Tray,
    /// Every non-fitting member is conduit-like.
    Conduit,
    /// Members of both families, or fittings only.
    Mixed,
}

/// One connected component of a route's assigned segment subset.
#[derive(Debug, Clone, PartialEq)]
pub struct Island {
    /// Member segment indices, ascending. Never empty.
    pub members: Vec<usize>,
    /// Union of the members' bounding boxes.
    pub bbox: BoundingBox,
    /// Family classification of the members.
    pub kind: IslandKind,
}

impl Island {
    /// Center of the island's bounding region.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        self.bbox.centroid()
    }

    /// Returns `true` if `idx` is a member.
    #[must_use]
    pub fn contains(&self, idx: usize) -> bool {
        self.members.binary_search(&idx).is_ok()
    }

    /// Members as a set, for restricted path searches.
    #[must_use]
    pub fn member_set(&self) -> HashSet<usize> {
        self.members.iter().copied().collect()
    }

    /// Number of members.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.members.len()
    }

    /// Always `false`; islands hold at least one segment.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Partition `assigned` into islands.
///
/// Breadth-first search is seeded from each unvisited assigned segment
/// in ascending index order, so island order and membership are stable
/// across runs. Every assigned segment lands in exactly one island.
/// Duplicate entries in `assigned` are ignored.
#[must_use]
pub fn detect_islands(network: &Network, assigned: &[usize]) -> Vec<Island> {
    let members: HashSet<usize> = assigned.iter().copied().collect();
    let mut seeds: Vec<usize> = members.iter().copied().collect();
    seeds.sort_unstable();

    let filtered = NodeFiltered::from_fn(network.graph(), |n: NodeIndex| {
        members.contains(&n.index())
    });

    let mut visited: HashSet<usize> = HashSet::with_capacity(members.len());
    let mut islands = Vec::new();

    for seed in seeds {
        if visited.contains(&seed) {
            continue;
        }

        let mut component = Vec::new();
        let mut bbox = network.segment(seed).bbox;
        let mut bfs = Bfs::new(&filtered, NodeIndex::new(seed));
        while let Some(node) = bfs.next(&filtered) {
            let idx = node.index();
            visited.insert(idx);
            bbox = bbox.union(&network.segment(idx).bbox);
            component.push(idx);
        }
        component.sort_unstable();

        let kind = classify(network, &component);
        islands.push(Island {
            members: component,
            bbox,
            kind,
        });
    }

    islands
}

/// Scan member families; fittings do not vote.
fn classify(network: &Network, members: &[usize]) -> IslandKind {
    let mut families = members
        .iter()
        .filter_map(|&idx| network.segment(idx).kind.family());
    let Some(first) = families.next() else {
        return IslandKind::Mixed;
    };
    if families.all(|f| f == first) {
        match first {
            Family::Tray => IslandKind::Tray,
            Family::Conduit => IslandKind::Conduit,
        }
    } else {
        IslandKind::Mixed
    }
}

/// Index of the island containing `idx`, if any.
#[must_use]
pub fn island_of(islands: &[Island], idx: usize) -> Option<usize> {
    islands.iter().position(|island| island.contains(idx))
}
