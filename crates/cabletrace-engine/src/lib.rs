//! cabletrace-engine: Pure cable route resolution over a containment
//! network (sans-IO).
//!
//! Resolves named point-to-point cable routes through:
//! graph build -> endpoint matching -> shortest path ->
//! island detection -> island ordering -> stitching -> formatting.
//!
//! This crate has **no I/O dependencies** -- it takes plain records and
//! returns plain records. File and terminal interaction lives in
//! `cabletrace-cli`.

pub mod diagnostics;
pub mod format;
pub mod island_path;
pub mod islands;
pub mod locate;
pub mod network;
pub mod pathfind;
pub mod resolve;
pub mod stitch;
pub mod types;

pub use diagnostics::{Clock, NoClock, RunDiagnostics, StatusCounts};
pub use island_path::{IslandWeighting, IslandWeightingKind};
pub use islands::{Island, IslandKind};
pub use network::Network;
pub use resolve::{
    Engine, NoProgress, Progress, ResultRow, RouteOutcome, RouteResult, RouteStatus, Side,
};
pub use stitch::{RoutePath, Transition};
pub use types::{
    BoundingBox, EngineConfig, EngineError, Equipment, Family, Point3, ReportInput,
    RouteFault, RouteRequest, Segment, SegmentKind,
};

/// Resolve every route in a report.
///
/// Builds the network once, then resolves routes in input order,
/// consulting `progress` between routes for cancellation. Output rows
/// are in the same order as `input.routes`, truncated if the run was
/// cancelled.
///
/// # Errors
///
/// Returns [`EngineError::InvalidConfig`] if `config` fails validation.
/// Returns [`EngineError::DuplicateSegment`] or
/// [`EngineError::DuplicateEquipment`] if identifiers collide.
pub fn run_report<P: Progress + ?Sized, C: Clock>(
    input: ReportInput,
    config: EngineConfig,
    progress: &mut P,
    clock: &C,
) -> Result<(Vec<RouteResult>, RunDiagnostics), EngineError> {
    let ReportInput {
        segments,
        equipment,
        routes,
    } = input;
    let engine = Engine::with_clock(segments, equipment, config, clock)?;
    Ok(engine.run(&routes, progress, clock))
}
