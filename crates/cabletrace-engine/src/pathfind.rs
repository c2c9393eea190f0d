//! Segment pathfinder: single-source shortest paths over the network,
//! restricted to an allowed subset of segments.
//!
//! Cost is incurred on *entering* a segment: moving from `a` to `b`
//! costs `b`'s physical length, and the start segment is free.
//!
//! # Tie-breaking
//!
//! The frontier is ordered by `(cost, index)` and an equal-cost
//! relaxation keeps the lower-index predecessor. Segment indices follow
//! identifier order (see [`Network`]), so equal-cost alternatives always
//! resolve to the same path no matter how the input was ordered.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::network::Network;

/// Costs closer than this are treated as equal.
const COST_EPSILON: f64 = 1e-9;

/// An ordered run of graph-adjacent segments.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPath {
    /// Segment indices from start to goal inclusive.
    pub segments: Vec<usize>,
    /// Sum of the lengths of every segment after the first.
    pub cost: f64,
}

/// Frontier entry; reversed ordering turns `BinaryHeap` into a min-heap.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    idx: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then(other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Settled costs and predecessors from one Dijkstra run.
struct SearchTree {
    cost: HashMap<usize, f64>,
    prev: HashMap<usize, usize>,
}

/// Dijkstra from `start`, stopping early once `goal` is settled.
fn search(
    network: &Network,
    start: usize,
    goal: Option<usize>,
    allowed: &HashSet<usize>,
) -> SearchTree {
    let mut cost: HashMap<usize, f64> = HashMap::new();
    let mut prev: HashMap<usize, usize> = HashMap::new();
    let mut settled: HashSet<usize> = HashSet::new();
    let mut heap = BinaryHeap::new();

    cost.insert(start, 0.0);
    heap.push(Frontier {
        cost: 0.0,
        idx: start,
    });

    while let Some(Frontier { cost: current, idx }) = heap.pop() {
        if !settled.insert(idx) {
            continue;
        }
        if goal == Some(idx) {
            break;
        }

        for next in network.neighbors(idx) {
            if !allowed.contains(&next) || settled.contains(&next) {
                continue;
            }
            let candidate = current + network.segment(next).length;
            match cost.get(&next) {
                Some(&known) if candidate > known - COST_EPSILON => {
                    // Equal cost: keep the lower-index predecessor.
                    if (candidate - known).abs() <= COST_EPSILON
                        && prev.get(&next).is_some_and(|&p| idx < p)
                    {
                        prev.insert(next, idx);
                    }
                }
                _ => {
                    cost.insert(next, candidate);
                    prev.insert(next, idx);
                    heap.push(Frontier {
                        cost: candidate,
                        idx: next,
                    });
                }
            }
        }
    }

    // Drop tentative entries that were never settled.
    cost.retain(|idx, _| settled.contains(idx));
    SearchTree { cost, prev }
}

/// Shortest path from `start` to `goal` through `allowed` segments.
///
/// Returns `None` when either endpoint is outside `allowed` or the goal
/// is unreachable within it.
#[must_use]
pub fn shortest_path(
    network: &Network,
    start: usize,
    goal: usize,
    allowed: &HashSet<usize>,
) -> Option<SegmentPath> {
    if !allowed.contains(&start) || !allowed.contains(&goal) {
        return None;
    }
    if start == goal {
        return Some(SegmentPath {
            segments: vec![start],
            cost: 0.0,
        });
    }

    let tree = search(network, start, Some(goal), allowed);
    let total = *tree.cost.get(&goal)?;

    let mut segments = vec![goal];
    let mut current = goal;
    while current != start {
        current = *tree.prev.get(&current)?;
        segments.push(current);
    }
    segments.reverse();

    Some(SegmentPath {
        segments,
        cost: total,
    })
}

/// Cost of reaching every allowed segment reachable from `start`.
#[must_use]
pub fn distances_from(
    network: &Network,
    start: usize,
    allowed: &HashSet<usize>,
) -> HashMap<usize, f64> {
    if !allowed.contains(&start) {
        return HashMap::new();
    }
    search(network, start, None, allowed).cost
}

/// The reachable segment with the greatest path cost from `start`,
/// breaking ties toward the lower index. Returns `start` itself when
/// nothing else is reachable.
#[must_use]
pub fn farthest_from(network: &Network, start: usize, allowed: &HashSet<usize>) -> usize {
    distances_from(network, start, allowed)
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
        .map_or(start, |(idx, _)| idx)
}
