//! Graph builder: turn a flat segment list into an undirected adjacency
//! graph based on coincident connection points.
//!
//! Comparing every connection point against every other is quadratic
//! in segment count. Instead, all connection points are bulk-loaded
//! into an R\*-tree and each point queries only the neighbours within
//! the coincidence tolerance.
//!
//! Segments are sorted by identifier before indexing, so a segment's
//! index order is its lexicographic identifier order. Downstream
//! searches break ties by index, which makes every result independent
//! of the order the collaborator supplied the segments in.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use rstar::RTree;
use rstar::primitives::GeomWithData;
use tracing::{debug, warn};

use crate::types::{EngineConfig, EngineError, Segment};

/// A connection point tagged with the index of its owning segment.
type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// Read-only containment network: segment table plus adjacency graph.
///
/// Built once per report run and shared by every route computation.
#[derive(Debug, Clone)]
pub struct Network {
    segments: Vec<Segment>,
    index: HashMap<String, usize>,
    graph: UnGraph<(), ()>,
    connection_points: usize,
}

impl Network {
    /// Build the network from the collaborator's segment list.
    ///
    /// Two segments are adjacent when any connection point of one lies
    /// within `config.coincidence_tolerance` of any connection point of
    /// the other, or when either lists the other in `connected_to`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the config fails
    /// validation and [`EngineError::DuplicateSegment`] if two segments
    /// share an identifier.
    pub fn build(mut segments: Vec<Segment>, config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        segments.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(pair) = segments.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(EngineError::DuplicateSegment(pair[0].id.clone()));
        }

        let index: HashMap<String, usize> = segments
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();

        let mut graph = UnGraph::<(), ()>::with_capacity(segments.len(), segments.len() * 2);
        for _ in &segments {
            graph.add_node(());
        }

        // Spatial pass: coincident connection points.
        let mut points: Vec<IndexedPoint> = Vec::new();
        for (i, segment) in segments.iter().enumerate() {
            for p in &segment.connection_points {
                if p.is_finite() {
                    points.push(GeomWithData::new(p.to_array(), i));
                } else {
                    warn!(segment = %segment.id, "skipping non-finite connection point");
                }
            }
        }
        let connection_points = points.len();
        let tree = RTree::bulk_load(points);
        let max_squared_radius = config.coincidence_tolerance * config.coincidence_tolerance;

        for entry in tree.iter() {
            let owner = entry.data;
            for other in tree.locate_within_distance(*entry.geom(), max_squared_radius) {
                // Each unordered pair is seen from both sides; add it once.
                if other.data > owner {
                    graph.update_edge(NodeIndex::new(owner), NodeIndex::new(other.data), ());
                }
            }
        }

        // Explicit relations reported by the source model.
        for (i, segment) in segments.iter().enumerate() {
            for target in &segment.connected_to {
                match index.get(target) {
                    Some(&j) if j != i => {
                        graph.update_edge(NodeIndex::new(i), NodeIndex::new(j), ());
                    }
                    Some(_) => {}
                    None => {
                        warn!(
                            segment = %segment.id,
                            target = %target,
                            "ignoring connection to unknown segment"
                        );
                    }
                }
            }
        }

        debug!(
            segments = segments.len(),
            connection_points,
            edges = graph.edge_count(),
            "network built"
        );

        Ok(Self {
            segments,
            index,
            graph,
            connection_points,
        })
    }

    /// Number of segments.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the network has no segments.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// All segments in index (identifier) order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The segment at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range. Indices handed out by this
    /// network are always in range.
    #[must_use]
    pub fn segment(&self, idx: usize) -> &Segment {
        &self.segments[idx]
    }

    /// Index of the segment with identifier `id`.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Indices of the segments adjacent to `idx`.
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph.neighbors(NodeIndex::new(idx)).map(NodeIndex::index)
    }

    /// Returns `true` if `a` and `b` share an edge.
    #[must_use]
    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        a != b
            && self
                .graph
                .find_edge(NodeIndex::new(a), NodeIndex::new(b))
                .is_some()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of finite connection points indexed.
    #[must_use]
    pub const fn connection_point_count(&self) -> usize {
        self.connection_points
    }

    /// Physical distance between two segments: the closest pair of
    /// connection points, or the centroid distance when either segment
    /// has no connection points.
    #[must_use]
    pub fn gap(&self, a: usize, b: usize) -> f64 {
        let sa = &self.segments[a];
        let sb = &self.segments[b];
        if sa.connection_points.is_empty() || sb.connection_points.is_empty() {
            return sa.location().distance(sb.location());
        }
        sa.connection_points
            .iter()
            .flat_map(|pa| sb.connection_points.iter().map(|pb| pa.distance(*pb)))
            .fold(f64::INFINITY, f64::min)
    }

    pub(crate) const fn graph(&self) -> &UnGraph<(), ()> {
        &self.graph
    }
}
