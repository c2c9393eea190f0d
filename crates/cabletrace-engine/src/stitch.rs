//! Path stitcher: assemble a best-effort path across disconnected
//! islands, and classify every step along a path.
//!
//! Given an island visiting order, the stitcher:
//!
//! 1. Enters the first island at the given entry segment.
//! 2. Picks, between each pair of consecutive islands, the segment pair
//!    with the smallest physical gap as the jump boundary.
//! 3. Leaves the last island at the given exit segment, or at the
//!    member farthest (by path cost) from where it entered.
//! 4. Runs the segment pathfinder inside each island between its entry
//!    and exit.
//! 5. Concatenates the per-island runs in visiting order, with a jump
//!    transition between islands.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::islands::Island;
use crate::network::Network;
use crate::pathfind::{farthest_from, shortest_path};
use crate::types::{EngineConfig, Family, RouteFault};

/// How one path element leads to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// Graph-adjacent, same containment family.
    Direct,
    /// Graph-adjacent, change of containment family.
    TypeTransition,
    /// Not adjacent; gap at or below the jump threshold.
    ShortJump,
    /// Not adjacent; gap above the jump threshold, or an unordered
    /// boundary between disconnected islands.
    LongJump,
}

impl Transition {
    /// Literal separator used in path descriptions.
    #[must_use]
    pub const fn separator(self) -> &'static str {
        match self {
            Self::Direct => ",",
            Self::TypeTransition => " + ",
            Self::ShortJump => " || ",
            Self::LongJump => " >> ",
        }
    }

    /// Returns `true` for virtual (non-physical) transitions.
    #[must_use]
    pub const fn is_jump(self) -> bool {
        matches!(self, Self::ShortJump | Self::LongJump)
    }
}

/// An ordered path of segments with a transition between each pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    /// Segment indices in travel order.
    pub segments: Vec<usize>,
    /// `transitions[i]` joins `segments[i]` and `segments[i + 1]`.
    pub transitions: Vec<Transition>,
    /// Physical length under the entry-cost model (jumps are free).
    pub cost: f64,
    bridged: f64,
}

impl RoutePath {
    /// Classify consecutive steps of `segments`.
    ///
    /// The containment family is carried through fittings, so a tray
    /// run that meets a conduit through a fitting still reports a type
    /// transition where the conduit starts.
    #[must_use]
    pub fn classify(network: &Network, segments: Vec<usize>, config: &EngineConfig) -> Self {
        let mut transitions = Vec::with_capacity(segments.len().saturating_sub(1));
        let mut cost = 0.0;
        let mut bridged = 0.0;
        let mut family: Option<Family> = segments
            .first()
            .and_then(|&s| network.segment(s).kind.family());

        for pair in segments.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let next_family = network.segment(b).kind.family();
            let mut transition = classify_transition(network, a, b, config);
            match transition {
                Transition::Direct => {
                    if let (Some(f), Some(g)) = (family, next_family)
                        && f != g
                    {
                        transition = Transition::TypeTransition;
                    }
                    cost += network.segment(b).length;
                }
                Transition::TypeTransition => cost += network.segment(b).length,
                Transition::ShortJump | Transition::LongJump => bridged += network.gap(a, b),
            }
            if next_family.is_some() {
                family = next_family;
            }
            transitions.push(transition);
        }

        Self {
            segments,
            transitions,
            cost,
            bridged,
        }
    }

    /// Returns `true` if the path has no segments.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.segments.len()
    }

    /// Number of virtual jumps.
    #[must_use]
    pub fn jump_count(&self) -> usize {
        self.transitions.iter().filter(|t| t.is_jump()).count()
    }

    /// Sum of the physical gaps bridged by jumps.
    #[must_use]
    pub const fn jump_distance(&self) -> f64 {
        self.bridged
    }

    /// Number of long jumps.
    #[must_use]
    pub fn long_jump_count(&self) -> usize {
        self.transitions
            .iter()
            .filter(|t| **t == Transition::LongJump)
            .count()
    }

    /// Preference order between alternative paths for the same route:
    /// fewer long jumps, fewer jumps, shorter bridged gaps, lower cost,
    /// fewer segments. `Less` means `self` is better.
    #[must_use]
    pub fn preference(&self, other: &Self) -> Ordering {
        self.long_jump_count()
            .cmp(&other.long_jump_count())
            .then(self.jump_count().cmp(&other.jump_count()))
            .then(self.bridged.total_cmp(&other.bridged))
            .then(self.cost.total_cmp(&other.cost))
            .then(self.len().cmp(&other.len()))
    }
}

/// Classify the step from `a` to `b` on its own.
///
/// Fittings are family-neutral here; [`RoutePath::classify`] carries
/// the family across them.
#[must_use]
pub fn classify_transition(
    network: &Network,
    a: usize,
    b: usize,
    config: &EngineConfig,
) -> Transition {
    if network.are_adjacent(a, b) {
        let from = network.segment(a).kind.family();
        let to = network.segment(b).kind.family();
        match (from, to) {
            (Some(f), Some(g)) if f != g => Transition::TypeTransition,
            _ => Transition::Direct,
        }
    } else if network.gap(a, b) <= config.jump_threshold {
        Transition::ShortJump
    } else {
        Transition::LongJump
    }
}

/// Where the last island of a stitched path is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitAnchor {
    /// A known segment, e.g. the one nearest the resolved destination.
    Segment(usize),
    /// Unknown destination: the member farthest from the island entry.
    Farthest,
}

/// Segment pair `(from a, from b)` with the smallest gap, ties toward
/// the lexicographically lower pair.
fn closest_pair(network: &Network, a: &Island, b: &Island) -> Option<(usize, usize)> {
    a.members
        .iter()
        .flat_map(|&sa| b.members.iter().map(move |&sb| (sa, sb)))
        .map(|(sa, sb)| (network.gap(sa, sb), sa, sb))
        .min_by(|x, y| x.0.total_cmp(&y.0).then((x.1, x.2).cmp(&(y.1, y.2))))
        .map(|(_, sa, sb)| (sa, sb))
}

/// Stitch a path through `islands` in `sequence` order.
///
/// # Errors
///
/// Returns [`RouteFault::ComputationFault`] if the sequence is empty,
/// references a missing island, the entry or exit segment is not in its
/// island, or an island turns out not to be internally connected.
pub fn stitch(
    network: &Network,
    islands: &[Island],
    sequence: &[usize],
    entry: usize,
    exit: ExitAnchor,
    config: &EngineConfig,
) -> Result<RoutePath, RouteFault> {
    let visit: Vec<&Island> = sequence
        .iter()
        .map(|&i| {
            islands
                .get(i)
                .ok_or_else(|| RouteFault::ComputationFault(format!("no island {i}")))
        })
        .collect::<Result<_, _>>()?;

    let (Some(first), Some(last)) = (visit.first(), visit.last()) else {
        return Err(RouteFault::ComputationFault(
            "empty island sequence".to_string(),
        ));
    };
    if !first.contains(entry) {
        return Err(RouteFault::ComputationFault(format!(
            "entry segment {} is not in the first island",
            network.segment(entry).id
        )));
    }
    if let ExitAnchor::Segment(s) = exit
        && !last.contains(s)
    {
        return Err(RouteFault::ComputationFault(format!(
            "exit segment {} is not in the last island",
            network.segment(s).id
        )));
    }

    let boundaries: Vec<(usize, usize)> = visit
        .windows(2)
        .map(|pair| {
            closest_pair(network, pair[0], pair[1]).ok_or_else(|| {
                RouteFault::ComputationFault("empty island in sequence".to_string())
            })
        })
        .collect::<Result<_, _>>()?;

    let mut segments = Vec::new();
    for (k, island) in visit.iter().enumerate() {
        let allowed = island.member_set();
        let inbound = if k == 0 { entry } else { boundaries[k - 1].1 };
        let outbound = match boundaries.get(k) {
            Some(&(out, _)) => out,
            None => match exit {
                ExitAnchor::Segment(s) => s,
                ExitAnchor::Farthest => farthest_from(network, inbound, &allowed),
            },
        };
        let run = shortest_path(network, inbound, outbound, &allowed).ok_or_else(|| {
            RouteFault::ComputationFault(format!(
                "island is not connected between {} and {}",
                network.segment(inbound).id,
                network.segment(outbound).id
            ))
        })?;
        segments.extend(run.segments);
    }

    Ok(RoutePath::classify(network, segments, config))
}

/// Last-resort rendering when no island order can be established:
/// each island on its own, joined by long jumps in island order.
///
/// Every member of every island is emitted. Inside an island the first
/// chain runs from its lowest-index leaf (a member with at most one
/// neighbour in the island) to the member farthest from it. Members the
/// chain missed are picked up by further chains, each restarting next to
/// what is already covered. A restart that is not adjacent to the
/// previous segment is a long jump, like an island boundary.
#[must_use]
pub fn disconnected_fallback(
    network: &Network,
    islands: &[Island],
    config: &EngineConfig,
) -> RoutePath {
    let mut segments = Vec::new();
    let mut restarts = Vec::new();
    for island in islands {
        let mut remaining = island.member_set();
        while let Some(start) = restart_point(network, island, &remaining) {
            let far = farthest_from(network, start, &remaining);
            let run = shortest_path(network, start, far, &remaining)
                .map_or_else(|| vec![start], |p| p.segments);
            if !segments.is_empty() {
                restarts.push(segments.len() - 1);
            }
            for s in &run {
                remaining.remove(s);
            }
            segments.extend(run);
        }
    }
    let mut path = RoutePath::classify(network, segments, config);
    for r in restarts {
        if path.transitions[r] == Transition::ShortJump {
            path.transitions[r] = Transition::LongJump;
        }
    }
    path
}

/// Where the next fallback chain of `island` begins, or `None` once
/// every member is covered.
///
/// Uncovered members touching a covered one come first; among those the
/// lowest-index leaf of the uncovered part wins, else the lowest index.
fn restart_point(network: &Network, island: &Island, remaining: &HashSet<usize>) -> Option<usize> {
    let open: Vec<usize> = island
        .members
        .iter()
        .copied()
        .filter(|m| remaining.contains(m))
        .collect();
    let touching: Vec<usize> = open
        .iter()
        .copied()
        .filter(|&m| network.neighbors(m).any(|n| island.contains(n) && !remaining.contains(&n)))
        .collect();
    let pool = if touching.is_empty() { &open } else { &touching };
    pool.iter()
        .copied()
        .find(|&m| network.neighbors(m).filter(|n| remaining.contains(n)).count() <= 1)
        .or_else(|| pool.first().copied())
}
