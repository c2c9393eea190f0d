//! Route resolver: the top-level per-route state machine.
//!
//! For each route the resolver matches both endpoint labels to
//! equipment, then tries for a fully connected path through the route's
//! assigned segments. When none exists it orders the disconnected
//! islands and stitches a best-effort path across them. Every route
//! yields exactly one [`RouteResult`]. A failure inside one route
//! becomes an `Error` row and never aborts the run.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::diagnostics::{Clock, NoClock, RunDiagnostics};
use crate::format::{branch_summary, describe_path};
use crate::island_path::{farthest_island, island_sequence};
use crate::islands::{Island, detect_islands, island_of};
use crate::locate::{locate_candidates, nearest_segment};
use crate::network::Network;
use crate::pathfind::shortest_path;
use crate::stitch::{ExitAnchor, RoutePath, disconnected_fallback, stitch};
use crate::types::{EngineConfig, EngineError, Equipment, RouteFault, RouteRequest, Segment};

/// Which endpoint of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The `from` endpoint.
    Start,
    /// The `to` endpoint.
    End,
}

/// Status label of a route result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteStatus {
    /// No segments assigned.
    Pending,
    /// Fully connected path between resolved endpoints.
    Confirmed,
    /// Approximate path across disconnected islands.
    #[serde(rename = "Unconfirmed-Virtual")]
    UnconfirmedVirtual,
    /// Only one endpoint resolved.
    #[serde(rename = "Partially-Confirmed")]
    PartiallyConfirmed,
    /// Processing the route failed.
    Error,
}

impl RouteStatus {
    /// Every status, in state-machine order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::UnconfirmedVirtual,
        Self::PartiallyConfirmed,
        Self::Error,
    ];

    /// Label used in result rows.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::UnconfirmedVirtual => "Unconfirmed-Virtual",
            Self::PartiallyConfirmed => "Partially-Confirmed",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one route, with the data each state carries.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// No segments assigned; nothing attempted.
    Pending,
    /// Fully connected path between both resolved endpoints.
    Confirmed {
        /// The connected path.
        path: RoutePath,
    },
    /// No fully connected path; stitched or degraded approximation.
    UnconfirmedVirtual {
        /// The approximate path, containing at least one jump unless
        /// neither endpoint resolved.
        path: RoutePath,
    },
    /// Only one endpoint resolved; the other end is inferred from the
    /// path geometry.
    PartiallyConfirmed {
        /// The inferred path, oriented from start to end.
        path: RoutePath,
        /// The endpoint that did resolve.
        resolved: Side,
    },
    /// A fault occurred while processing this route.
    Error {
        /// Diagnostic message.
        message: String,
    },
}

impl RouteOutcome {
    /// The status label for this outcome.
    #[must_use]
    pub const fn status(&self) -> RouteStatus {
        match self {
            Self::Pending => RouteStatus::Pending,
            Self::Confirmed { .. } => RouteStatus::Confirmed,
            Self::UnconfirmedVirtual { .. } => RouteStatus::UnconfirmedVirtual,
            Self::PartiallyConfirmed { .. } => RouteStatus::PartiallyConfirmed,
            Self::Error { .. } => RouteStatus::Error,
        }
    }

    /// The path, for outcomes that carry one.
    #[must_use]
    pub const fn path(&self) -> Option<&RoutePath> {
        match self {
            Self::Confirmed { path }
            | Self::UnconfirmedVirtual { path }
            | Self::PartiallyConfirmed { path, .. } => Some(path),
            Self::Pending | Self::Error { .. } => None,
        }
    }
}

/// Result of resolving one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    /// Route identifier from the request.
    pub route_id: String,
    /// Resolved source label, or the input label when unresolved.
    pub from_label: String,
    /// Resolved destination label, or the input label when unresolved.
    pub to_label: String,
    /// Status and the data it carries.
    pub outcome: RouteOutcome,
    /// Comma-joined distinct branch codes along the path.
    pub branch_summary: String,
    /// Path rendered with transition separators, or the diagnostic
    /// message for `Error` outcomes.
    pub path_description: String,
    /// Every fault met while resolving, in the order encountered.
    /// Empty for a clean `Confirmed` route.
    pub faults: Vec<RouteFault>,
}

impl RouteResult {
    /// Status label of the outcome.
    #[must_use]
    pub const fn status(&self) -> RouteStatus {
        self.outcome.status()
    }

    /// Flatten into an output row.
    #[must_use]
    pub fn to_row(&self) -> ResultRow {
        ResultRow {
            route_id: self.route_id.clone(),
            from_label: self.from_label.clone(),
            to_label: self.to_label.clone(),
            status: self.status(),
            branch_summary: self.branch_summary.clone(),
            path_description: self.path_description.clone(),
        }
    }
}

/// One flat output record per route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Route identifier.
    pub route_id: String,
    /// Resolved or echoed source label.
    pub from_label: String,
    /// Resolved or echoed destination label.
    pub to_label: String,
    /// Status label.
    pub status: RouteStatus,
    /// Comma-joined distinct branch codes.
    pub branch_summary: String,
    /// Path with separators, or the error message.
    pub path_description: String,
}

/// Progress reporting and cooperative cancellation for [`Engine::run`].
///
/// Both hooks are called between routes only.
pub trait Progress {
    /// Whether the run should stop before the next route.
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Called after each route with its position in the batch.
    fn route_finished(&mut self, _index: usize, _total: usize, _result: &RouteResult) {}
}

/// Progress sink that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

impl Progress for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl Progress for &AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Labels and outcome for one route, before rendering.
struct Resolved {
    from_label: String,
    to_label: String,
    outcome: RouteOutcome,
    faults: Vec<RouteFault>,
}

/// Read-only route engine for one report run.
///
/// Holds the network and equipment table; every route computation
/// borrows them immutably.
#[derive(Debug, Clone)]
pub struct Engine {
    network: Network,
    equipment: Vec<Equipment>,
    config: EngineConfig,
    build_duration: Duration,
}

impl Engine {
    /// Build the network and equipment table.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on an invalid config or duplicate
    /// segment or equipment ids.
    pub fn new(
        segments: Vec<Segment>,
        equipment: Vec<Equipment>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        Self::with_clock(segments, equipment, config, &NoClock)
    }

    /// Like [`Engine::new`], timing the network build with `clock`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::new`].
    pub fn with_clock<C: Clock>(
        segments: Vec<Segment>,
        mut equipment: Vec<Equipment>,
        config: EngineConfig,
        clock: &C,
    ) -> Result<Self, EngineError> {
        let start = clock.now();
        let network = Network::build(segments, &config)?;
        let build_duration = clock.elapsed(&start);

        equipment.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(pair) = equipment.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(EngineError::DuplicateEquipment(pair[0].id.clone()));
        }

        Ok(Self {
            network,
            equipment,
            config,
            build_duration,
        })
    }

    /// The containment network.
    #[must_use]
    pub const fn network(&self) -> &Network {
        &self.network
    }

    /// Equipment records, sorted by id.
    #[must_use]
    pub fn equipment(&self) -> &[Equipment] {
        &self.equipment
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve every route in order.
    ///
    /// `progress` is consulted before each route; once it reports
    /// cancellation the run stops and returns the rows produced so far.
    pub fn run<P: Progress + ?Sized, C: Clock>(
        &self,
        routes: &[RouteRequest],
        progress: &mut P,
        clock: &C,
    ) -> (Vec<RouteResult>, RunDiagnostics) {
        let mut diagnostics = RunDiagnostics {
            segment_count: self.network.len(),
            connection_point_count: self.network.connection_point_count(),
            edge_count: self.network.edge_count(),
            equipment_count: self.equipment.len(),
            routes_total: routes.len(),
            build_duration: self.build_duration,
            ..RunDiagnostics::default()
        };
        info!(
            routes = routes.len(),
            segments = diagnostics.segment_count,
            edges = diagnostics.edge_count,
            "route run started"
        );

        let start = clock.now();
        let mut results = Vec::with_capacity(routes.len());
        for (i, route) in routes.iter().enumerate() {
            if progress.is_cancelled() {
                info!(processed = i, total = routes.len(), "route run cancelled");
                diagnostics.cancelled = true;
                break;
            }
            let result = self.resolve_route(route);
            diagnostics.status_counts.record(result.status());
            progress.route_finished(i, routes.len(), &result);
            results.push(result);
        }
        diagnostics.route_duration = clock.elapsed(&start);
        diagnostics.routes_processed = results.len();

        info!(
            processed = diagnostics.routes_processed,
            confirmed = diagnostics.status_counts.confirmed,
            errors = diagnostics.status_counts.error,
            "route run finished"
        );
        (results, diagnostics)
    }

    /// Resolve a single route. Never fails: faults become `Error` rows.
    #[must_use]
    pub fn resolve_route(&self, route: &RouteRequest) -> RouteResult {
        let resolved = match self.compute(route) {
            Ok(resolved) => resolved,
            Err(RouteFault::NoContainmentAssigned) => Resolved {
                from_label: route.from_label.clone(),
                to_label: route.to_label.clone(),
                outcome: RouteOutcome::Pending,
                faults: vec![RouteFault::NoContainmentAssigned],
            },
            Err(fault) => {
                warn!(route = %route.route_id, %fault, "route failed");
                Resolved {
                    from_label: route.from_label.clone(),
                    to_label: route.to_label.clone(),
                    outcome: RouteOutcome::Error {
                        message: fault.to_string(),
                    },
                    faults: vec![fault],
                }
            }
        };

        let (summary, description) = match &resolved.outcome {
            RouteOutcome::Error { message } => (String::new(), message.clone()),
            outcome => outcome.path().map_or_else(Default::default, |path| {
                (
                    branch_summary(&self.network, path, self.config.branch_separator),
                    describe_path(&self.network, path),
                )
            }),
        };

        debug!(
            route = %route.route_id,
            status = %resolved.outcome.status(),
            path = %description,
            "route resolved"
        );

        RouteResult {
            route_id: route.route_id.clone(),
            from_label: resolved.from_label,
            to_label: resolved.to_label,
            outcome: resolved.outcome,
            branch_summary: summary,
            path_description: description,
            faults: resolved.faults,
        }
    }

    fn compute(&self, route: &RouteRequest) -> Result<Resolved, RouteFault> {
        let assigned = self.assigned_indices(route)?;
        let allowed: HashSet<usize> = assigned.iter().copied().collect();
        let islands = detect_islands(&self.network, &assigned);

        let mut faults = Vec::new();
        let starts = self.endpoint(&route.from_label, &route.route_id, &mut faults);
        let ends = self.endpoint(&route.to_label, &route.route_id, &mut faults);

        let (outcome, start_eq, end_eq) = match (starts.is_empty(), ends.is_empty()) {
            (false, false) => {
                let resolved = self.both_resolved(&assigned, &allowed, &islands, &starts, &ends)?;
                if matches!(resolved.0, RouteOutcome::UnconfirmedVirtual { .. }) {
                    faults.push(RouteFault::Disconnected);
                }
                resolved
            }
            (false, true) => {
                let (path, eq) = self.one_resolved(&assigned, &islands, &starts, Side::Start)?;
                let outcome = RouteOutcome::PartiallyConfirmed {
                    path,
                    resolved: Side::Start,
                };
                (outcome, Some(eq), None)
            }
            (true, false) => {
                let (path, eq) = self.one_resolved(&assigned, &islands, &ends, Side::End)?;
                let outcome = RouteOutcome::PartiallyConfirmed {
                    path,
                    resolved: Side::End,
                };
                (outcome, None, Some(eq))
            }
            (true, true) => {
                let path = disconnected_fallback(&self.network, &islands, &self.config);
                (RouteOutcome::UnconfirmedVirtual { path }, None, None)
            }
        };

        let label = |eq: Option<&Equipment>, input: &str| {
            eq.map_or_else(|| input.to_string(), |e| e.label().to_string())
        };
        Ok(Resolved {
            from_label: label(start_eq, &route.from_label),
            to_label: label(end_eq, &route.to_label),
            outcome,
            faults,
        })
    }

    /// Assigned segment indices with duplicates collapsed, in first-seen
    /// order.
    fn assigned_indices(&self, route: &RouteRequest) -> Result<Vec<usize>, RouteFault> {
        if route.assigned_segment_ids.is_empty() {
            return Err(RouteFault::NoContainmentAssigned);
        }
        let mut seen = HashSet::new();
        let mut assigned = Vec::new();
        for id in &route.assigned_segment_ids {
            let idx = self
                .network
                .index_of(id)
                .ok_or_else(|| RouteFault::ComputationFault(format!("unknown segment id {id}")))?;
            self.network
                .segment(idx)
                .validate()
                .map_err(RouteFault::ComputationFault)?;
            if seen.insert(idx) {
                assigned.push(idx);
            }
        }
        Ok(assigned)
    }

    /// Equipment candidates for `label`, recording a fault when there
    /// are none.
    fn endpoint(
        &self,
        label: &str,
        route_id: &str,
        faults: &mut Vec<RouteFault>,
    ) -> Vec<&Equipment> {
        let found = locate_candidates(label, &self.equipment);
        if found.is_empty() {
            warn!(route = route_id, label, "endpoint unresolved");
            faults.push(RouteFault::EndpointUnresolved {
                label: label.to_string(),
            });
        }
        found
    }

    /// Segment nearest to `equipment` among the assigned ones.
    fn anchor(&self, assigned: &[usize], equipment: &Equipment) -> Result<usize, RouteFault> {
        nearest_segment(&self.network, assigned, equipment.location).ok_or_else(|| {
            RouteFault::ComputationFault("no assigned segment to anchor on".to_string())
        })
    }

    /// Every start/end candidate pair is tried. A connected path wins
    /// on lowest cost; failing that the most preferable stitched path
    /// wins. Ties keep the earliest pair.
    #[allow(clippy::type_complexity)]
    fn both_resolved<'a>(
        &self,
        assigned: &[usize],
        allowed: &HashSet<usize>,
        islands: &[Island],
        starts: &[&'a Equipment],
        ends: &[&'a Equipment],
    ) -> Result<(RouteOutcome, Option<&'a Equipment>, Option<&'a Equipment>), RouteFault> {
        let mut pairs = Vec::with_capacity(starts.len() * ends.len());
        for &s in starts {
            let from = self.anchor(assigned, s)?;
            for &e in ends {
                pairs.push((s, e, from, self.anchor(assigned, e)?));
            }
        }

        let mut direct: Option<(RoutePath, &Equipment, &Equipment)> = None;
        for &(s, e, from, to) in &pairs {
            let Some(found) = shortest_path(&self.network, from, to, allowed) else {
                continue;
            };
            if direct.as_ref().is_none_or(|(best, ..)| found.cost < best.cost) {
                let path = RoutePath::classify(&self.network, found.segments, &self.config);
                direct = Some((path, s, e));
            }
        }
        if let Some((path, s, e)) = direct {
            return Ok((RouteOutcome::Confirmed { path }, Some(s), Some(e)));
        }

        debug!(islands = islands.len(), "no connected path, stitching islands");
        let mut stitched: Option<(RoutePath, &Equipment, &Equipment)> = None;
        for &(s, e, from, to) in &pairs {
            let path = self.stitch_between(islands, from, ExitAnchor::Segment(to), to)?;
            if stitched
                .as_ref()
                .is_none_or(|(best, ..)| path.preference(best).is_lt())
            {
                stitched = Some((path, s, e));
            }
        }
        let (path, s, e) = stitched.ok_or_else(|| {
            RouteFault::ComputationFault("no endpoint combination to stitch".to_string())
        })?;
        Ok((RouteOutcome::UnconfirmedVirtual { path }, Some(s), Some(e)))
    }

    /// Only one side resolved: start from its anchor and head for the
    /// island farthest away, leaving it at its farthest segment. The
    /// path is returned oriented from start to end.
    fn one_resolved<'a>(
        &self,
        assigned: &[usize],
        islands: &[Island],
        candidates: &[&'a Equipment],
        side: Side,
    ) -> Result<(RoutePath, &'a Equipment), RouteFault> {
        let mut best: Option<(RoutePath, &Equipment)> = None;
        for &candidate in candidates {
            let from = self.anchor(assigned, candidate)?;
            let here = island_of(islands, from).ok_or_else(|| {
                RouteFault::ComputationFault("anchor outside every island".to_string())
            })?;
            let far = farthest_island(islands, here, &self.config.island_weighting);
            let Some(&target) = islands.get(far).and_then(|island| island.members.first()) else {
                continue;
            };
            let path = self.stitch_between(islands, from, ExitAnchor::Farthest, target)?;
            if best
                .as_ref()
                .is_none_or(|(current, _)| path.preference(current).is_lt())
            {
                best = Some((path, candidate));
            }
        }

        let (path, candidate) = best.ok_or_else(|| {
            RouteFault::ComputationFault("no anchor for resolved endpoint".to_string())
        })?;
        let path = match side {
            Side::Start => path,
            Side::End => {
                let mut segments = path.segments;
                segments.reverse();
                RoutePath::classify(&self.network, segments, &self.config)
            }
        };
        Ok((path, candidate))
    }

    /// Stitch from `from` to the island holding `target`, degrading to
    /// the unordered fallback when no island order exists.
    fn stitch_between(
        &self,
        islands: &[Island],
        from: usize,
        exit: ExitAnchor,
        target: usize,
    ) -> Result<RoutePath, RouteFault> {
        let order = island_of(islands, from)
            .zip(island_of(islands, target))
            .and_then(|(a, b)| island_sequence(islands, a, b, &self.config.island_weighting));
        match order {
            Some(sequence) => stitch(&self.network, islands, &sequence, from, exit, &self.config),
            None => Ok(disconnected_fallback(&self.network, islands, &self.config)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::network::tests::straight;
    use crate::types::{BoundingBox, Point3, SegmentKind};

    fn equipment(id: &str, code: &str, x: f64) -> Equipment {
        Equipment {
            id: id.to_string(),
            structured_code: code.to_string(),
            display_name: String::new(),
            location: Point3::new(x, 0.0, 0.0),
        }
    }

    fn route(id: &str, from: &str, to: &str, assigned: &[&str]) -> RouteRequest {
        RouteRequest {
            route_id: id.to_string(),
            from_label: from.to_string(),
            to_label: to.to_string(),
            assigned_segment_ids: assigned.iter().map(ToString::to_string).collect(),
        }
    }

    fn chain_engine() -> Engine {
        Engine::new(
            vec![
                straight("S1", SegmentKind::Tray, 0.0, 2.0),
                straight("S2", SegmentKind::Tray, 2.0, 5.0),
                straight("S3", SegmentKind::Tray, 5.0, 9.0),
                straight("S4", SegmentKind::Tray, 12.0, 14.0),
            ],
            vec![
                equipment("E1", "MSB", -0.5),
                equipment("E2", "DB1", 9.5),
                equipment("E3", "DB2", 14.5),
            ],
            EngineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn status_labels() {
        assert_eq!(RouteStatus::UnconfirmedVirtual.to_string(), "Unconfirmed-Virtual");
        assert_eq!(RouteStatus::PartiallyConfirmed.to_string(), "Partially-Confirmed");
        let json = serde_json::to_string(&RouteStatus::PartiallyConfirmed).unwrap();
        assert_eq!(json, "\"Partially-Confirmed\"");
    }

    #[test]
    fn duplicate_equipment_rejected() {
        let err = Engine::new(
            Vec::new(),
            vec![equipment("E1", "A", 0.0), equipment("E1", "B", 0.0)],
            EngineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::DuplicateEquipment("E1".to_string()));
    }

    #[test]
    fn confirmed_path() {
        let engine = chain_engine();
        let result = engine.resolve_route(&route("C1", "from MSB", "to DB1", &["S1", "S2", "S3"]));
        assert_eq!(result.status(), RouteStatus::Confirmed);
        assert_eq!(result.path_description, "S1,S2,S3");
        assert_eq!(result.from_label, "MSB");
        assert_eq!(result.to_label, "DB1");
        assert!(result.faults.is_empty());
        let path = result.outcome.path().unwrap();
        assert!((path.cost - 7.0).abs() < 1e-12);
    }

    #[test]
    fn duplicate_assignment_collapses() {
        let engine = chain_engine();
        let result = engine.resolve_route(&route("C1", "MSB", "DB1", &["S3", "S1", "S2", "S1"]));
        assert_eq!(result.status(), RouteStatus::Confirmed);
        assert_eq!(result.path_description, "S1,S2,S3");
    }

    #[test]
    fn pending_without_assignment() {
        let engine = chain_engine();
        let result = engine.resolve_route(&route("C1", "MSB", "DB1", &[]));
        assert_eq!(result.outcome, RouteOutcome::Pending);
        assert!(result.path_description.is_empty());
        assert!(result.branch_summary.is_empty());
        assert_eq!(result.from_label, "MSB");
        assert_eq!(result.faults, [RouteFault::NoContainmentAssigned]);
    }

    #[test]
    fn unknown_segment_is_error_row() {
        let engine = chain_engine();
        let result = engine.resolve_route(&route("C1", "MSB", "DB1", &["S1", "NOPE"]));
        assert_eq!(result.status(), RouteStatus::Error);
        assert!(result.path_description.contains("NOPE"));
        assert!(result.outcome.path().is_none());
        assert!(matches!(
            result.faults.as_slice(),
            [RouteFault::ComputationFault(msg)] if msg.contains("NOPE")
        ));
    }

    #[test]
    fn malformed_length_is_error_row() {
        let mut bad = straight("S9", SegmentKind::Tray, 0.0, 1.0);
        bad.length = f64::NAN;
        let engine = Engine::new(vec![bad], Vec::new(), EngineConfig::default()).unwrap();
        let result = engine.resolve_route(&route("C1", "A", "B", &["S9"]));
        assert_eq!(result.status(), RouteStatus::Error);
        assert!(result.path_description.starts_with("computation fault"));
    }

    #[test]
    fn stitched_across_gap() {
        let engine = chain_engine();
        let result = engine.resolve_route(&route("C1", "MSB", "DB2", &["S1", "S2", "S3", "S4"]));
        assert_eq!(result.status(), RouteStatus::UnconfirmedVirtual);
        assert_eq!(result.path_description, "S1,S2,S3 >> S4");
        assert_eq!(result.faults, [RouteFault::Disconnected]);
    }

    #[test]
    fn start_only_is_partially_confirmed() {
        let engine = chain_engine();
        let result = engine.resolve_route(&route("C1", "MSB", "Unknown", &["S1", "S2", "S3"]));
        assert_eq!(result.outcome.status(), RouteStatus::PartiallyConfirmed);
        assert_eq!(result.path_description, "S1,S2,S3");
        assert_eq!(result.from_label, "MSB");
        assert_eq!(result.to_label, "Unknown");
        assert_eq!(
            result.faults,
            [RouteFault::EndpointUnresolved {
                label: "Unknown".to_string()
            }]
        );
        assert!(matches!(
            result.outcome,
            RouteOutcome::PartiallyConfirmed {
                resolved: Side::Start,
                ..
            }
        ));
    }

    #[test]
    fn end_only_is_oriented_start_to_end() {
        let engine = chain_engine();
        let result = engine.resolve_route(&route("C1", "Unknown", "DB1", &["S1", "S2", "S3"]));
        assert_eq!(result.status(), RouteStatus::PartiallyConfirmed);
        // Inferred start is the far end of the island; path ends at DB1.
        assert_eq!(result.path_description, "S1,S2,S3");
        assert_eq!(result.to_label, "DB1");
    }

    #[test]
    fn neither_side_degrades() {
        let engine = chain_engine();
        let result = engine.resolve_route(&route("C1", "?", "??", &["S1", "S2", "S4"]));
        assert_eq!(result.status(), RouteStatus::UnconfirmedVirtual);
        assert_eq!(result.path_description, "S1,S2 >> S4");
        assert_eq!(result.faults.len(), 2);
        assert_eq!(
            result.faults[1],
            RouteFault::EndpointUnresolved {
                label: "??".to_string()
            }
        );
    }

    #[test]
    fn end_only_jumps_from_farthest_island() {
        let engine = chain_engine();
        let result = engine.resolve_route(&route("C1", "Unknown", "DB2", &["S1", "S2", "S4"]));
        assert_eq!(result.status(), RouteStatus::PartiallyConfirmed);
        // Inferred start is in the island farthest from DB2; the path
        // still ends on S4 next to DB2.
        assert_eq!(result.path_description, "S1,S2 >> S4");
        assert_eq!(result.from_label, "Unknown");
        assert_eq!(result.to_label, "DB2");
        assert!(matches!(
            result.outcome,
            RouteOutcome::PartiallyConfirmed {
                resolved: Side::End,
                ..
            }
        ));
    }

    #[test]
    fn neither_side_keeps_tee_branches() {
        let mut spur = straight("S3", SegmentKind::Tray, 0.0, 1.0);
        let corner = Point3::new(0.0, 0.0, 0.0);
        let top = Point3::new(0.0, 1.0, 0.0);
        spur.bbox = BoundingBox::from_points(&[corner, top]).unwrap();
        spur.connection_points = vec![corner, top];
        let engine = Engine::new(
            vec![
                straight("S1", SegmentKind::Tray, -1.0, 0.0),
                straight("S2", SegmentKind::Tray, 0.0, 1.0),
                spur,
            ],
            Vec::new(),
            EngineConfig::default(),
        )
        .unwrap();
        let result = engine.resolve_route(&route("C1", "?", "?", &["S1", "S2", "S3"]));
        assert_eq!(result.status(), RouteStatus::UnconfirmedVirtual);
        assert_eq!(result.path_description, "S1,S2,S3");
    }

    #[test]
    fn multiple_candidates_pick_cheapest_pair() {
        let engine = Engine::new(
            vec![
                straight("S1", SegmentKind::Tray, 0.0, 2.0),
                straight("S2", SegmentKind::Tray, 2.0, 5.0),
                straight("S3", SegmentKind::Tray, 5.0, 9.0),
            ],
            vec![
                equipment("E1", "LP", -0.5),
                equipment("E2", "LP", 4.0),
                equipment("E3", "DB", 9.5),
            ],
            EngineConfig::default(),
        )
        .unwrap();
        let result = engine.resolve_route(&route("C1", "LP", "DB", &["S1", "S2", "S3"]));
        assert_eq!(result.status(), RouteStatus::Confirmed);
        // E2 sits over S2, which is one segment closer to DB.
        assert_eq!(result.path_description, "S2,S3");
    }

    #[test]
    fn run_counts_statuses() {
        let engine = chain_engine();
        let routes = vec![
            route("C1", "MSB", "DB1", &["S1", "S2", "S3"]),
            route("C2", "MSB", "DB1", &[]),
            route("C3", "MSB", "DB1", &["X"]),
        ];
        let (results, diag) = engine.run(&routes, &mut NoProgress, &NoClock);
        assert_eq!(results.len(), 3);
        assert_eq!(diag.routes_processed, 3);
        assert!(!diag.cancelled);
        assert_eq!(diag.status_counts.confirmed, 1);
        assert_eq!(diag.status_counts.pending, 1);
        assert_eq!(diag.status_counts.error, 1);
        assert_eq!(diag.segment_count, 4);
        assert_eq!(diag.equipment_count, 3);
    }

    #[test]
    fn cancellation_stops_between_routes() {
        struct StopAfter(usize);
        impl Progress for StopAfter {
            fn is_cancelled(&self) -> bool {
                self.0 == 0
            }
            fn route_finished(&mut self, _index: usize, _total: usize, _result: &RouteResult) {
                self.0 = self.0.saturating_sub(1);
            }
        }

        let engine = chain_engine();
        let routes = vec![
            route("C1", "MSB", "DB1", &["S1"]),
            route("C2", "MSB", "DB1", &["S2"]),
            route("C3", "MSB", "DB1", &["S3"]),
        ];
        let (results, diag) = engine.run(&routes, &mut StopAfter(2), &NoClock);
        assert_eq!(results.len(), 2);
        assert!(diag.cancelled);
        assert_eq!(diag.routes_processed, 2);

        let flag = AtomicBool::new(true);
        let (results, diag) = engine.run(&routes, &mut &flag, &NoClock);
        assert!(results.is_empty());
        assert!(diag.cancelled);
    }

    #[test]
    fn to_row_flattens() {
        let engine = chain_engine();
        let row = engine
            .resolve_route(&route("C1", "MSB", "DB1", &["S1", "S2"]))
            .to_row();
        assert_eq!(row.route_id, "C1");
        assert_eq!(row.status, RouteStatus::Confirmed);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["status"], "Confirmed");
    }
}
