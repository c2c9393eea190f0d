//! Island pathfinder: order disconnected islands into the cheapest
//! visiting sequence between a start island and an end island.
//!
//! Every pair of islands is joined by a synthetic edge, giving a
//! complete quotient graph. The edge weight is a heuristic, not a
//! physical measurement: there is no real wiring between islands, only
//! an estimate of how far a cable would have to jump. Weighting is
//! pluggable through [`IslandWeighting`], with [`IslandWeightingKind`]
//! for runtime selection.

use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

use crate::islands::Island;

/// Selects how synthetic inter-island edges are weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IslandWeightingKind {
    /// Euclidean distance between bounding-region centroids.
    ///
    /// Distances obey the triangle inequality, so an intermediate
    /// island is only visited when it lies exactly on the way.
    #[default]
    Centroid,

    /// Squared centroid distance.
    ///
    /// Penalizes long jumps, so the search prefers several short hops
    /// through intermediate islands over one long jump.
    SquaredCentroid,

    /// Clearance between bounding regions (zero when they touch).
    ///
    /// Better for long runs whose centroids sit far apart even though
    /// their ends nearly meet.
    Gap,
}

/// Trait for inter-island edge weighting strategies.
pub trait IslandWeighting {
    /// Non-negative weight of the synthetic edge between `a` and `b`.
    fn weight(&self, a: &Island, b: &Island) -> f64;
}

impl IslandWeighting for IslandWeightingKind {
    fn weight(&self, a: &Island, b: &Island) -> f64 {
        match *self {
            Self::Centroid => a.centroid().distance(b.centroid()),
            Self::SquaredCentroid => a.centroid().distance_squared(b.centroid()),
            Self::Gap => a.bbox.distance_to_box(&b.bbox),
        }
    }
}

/// Lowest-total-weight island sequence from `start` to `end`, both
/// inclusive.
///
/// Returns `None` if either index is out of range. A start equal to the
/// end yields a single-island sequence.
#[must_use]
pub fn island_sequence<W: IslandWeighting + ?Sized>(
    islands: &[Island],
    start: usize,
    end: usize,
    weighting: &W,
) -> Option<Vec<usize>> {
    if start >= islands.len() || end >= islands.len() {
        return None;
    }
    if start == end {
        return Some(vec![start]);
    }

    let n = islands.len();
    let mut graph = UnGraph::<(), f64>::with_capacity(n, n * (n - 1) / 2);
    for _ in islands {
        graph.add_node(());
    }
    for i in 0..n {
        for j in (i + 1)..n {
            let w = weighting.weight(&islands[i], &islands[j]).max(0.0);
            graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), w);
        }
    }

    // A* with a zero heuristic is Dijkstra that also returns the path.
    let goal = NodeIndex::new(end);
    let (_, path) = astar(
        &graph,
        NodeIndex::new(start),
        |node| node == goal,
        |edge| *edge.weight(),
        |_| 0.0,
    )?;
    Some(path.into_iter().map(NodeIndex::index).collect())
}

/// The island with the greatest weight from `from`, ties toward the
/// lower index. Returns `from` when it is the only island.
#[must_use]
pub fn farthest_island<W: IslandWeighting + ?Sized>(
    islands: &[Island],
    from: usize,
    weighting: &W,
) -> usize {
    let Some(origin) = islands.get(from) else {
        return from;
    };
    islands
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != from)
        .map(|(i, island)| (i, weighting.weight(origin, island)))
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
        .map_or(from, |(i, _)| i)
}
