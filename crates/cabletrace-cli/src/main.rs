//! cabletrace: batch cable route resolution from JSON report inputs.
//!
//! Reads a report (segments, equipment, routes) exported from the
//! building model, resolves every route through the containment
//! network, and prints one row per route. Useful for:
//!
//! - Producing a cable schedule with route status and path description
//! - Checking how tolerance and jump thresholds change the outcome
//! - Comparing island weighting strategies on disconnected data
//! - Auditing network connectivity before routing (`inspect`)
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin cabletrace -- run [OPTIONS] <INPUT>
//! cargo run --release --bin cabletrace -- inspect [OPTIONS] <INPUT>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use cabletrace_engine::islands::detect_islands;
use cabletrace_engine::{
    Clock, Engine, EngineConfig, IslandKind, IslandWeightingKind, Progress, ReportInput,
    RouteResult,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Cable route resolution over containment networks.
#[derive(Parser)]
#[command(name = "cabletrace", version)]
struct Cli {
    /// Log filter directive (e.g. `debug`, `cabletrace_engine=trace`).
    ///
    /// Overrides `RUST_LOG`. Defaults to `info`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve every route in a report and print the result rows.
    Run(RunArgs),
    /// Print network statistics without resolving routes.
    Inspect(InspectArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Path to the report JSON.
    input: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,

    /// Output rows as JSON instead of a tab-separated table.
    #[arg(long)]
    json: bool,

    /// Print run diagnostics to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Stop after this many routes.
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    limit: Option<usize>,
}

#[derive(Args)]
struct InspectArgs {
    /// Path to the report JSON.
    input: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,

    /// Output statistics as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ConfigArgs {
    /// Distance below which connection points are coincident.
    #[arg(long, default_value_t = EngineConfig::DEFAULT_COINCIDENCE_TOLERANCE)]
    coincidence_tolerance: f64,

    /// Boundary between short and long jumps.
    #[arg(long, default_value_t = EngineConfig::DEFAULT_JUMP_THRESHOLD)]
    jump_threshold: f64,

    /// Weighting used to order disconnected islands.
    #[arg(long, value_enum, default_value_t = Weighting::Centroid)]
    weighting: Weighting,

    /// Delimiter before the branch code in segment identifiers.
    #[arg(long, default_value_t = EngineConfig::DEFAULT_BRANCH_SEPARATOR)]
    branch_separator: char,

    /// Full engine config as a JSON string.
    ///
    /// When provided, all other engine parameter flags are ignored.
    /// The JSON must be a valid `EngineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Island weighting selection.
#[derive(Clone, Copy, ValueEnum)]
enum Weighting {
    /// Distance between island centroids.
    Centroid,
    /// Squared centroid distance; favours several short hops.
    SquaredCentroid,
    /// Clearance between island bounding boxes.
    Gap,
}

/// Build an [`EngineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(args: &ConfigArgs) -> Result<EngineConfig, String> {
    if let Some(ref json) = args.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(EngineConfig {
        coincidence_tolerance: args.coincidence_tolerance,
        jump_threshold: args.jump_threshold,
        island_weighting: match args.weighting {
            Weighting::Centroid => IslandWeightingKind::Centroid,
            Weighting::SquaredCentroid => IslandWeightingKind::SquaredCentroid,
            Weighting::Gap => IslandWeightingKind::Gap,
        },
        branch_separator: args.branch_separator,
    })
}

fn init_logging(directive: Option<&str>) -> Result<(), String> {
    let filter = match directive {
        Some(d) => EnvFilter::try_new(d).map_err(|e| format!("Invalid --log-level: {e}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_report(path: &Path) -> Result<ReportInput, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let input: ReportInput = serde_json::from_str(&text)
        .map_err(|e| format!("Error parsing {}: {e}", path.display()))?;
    info!(
        path = %path.display(),
        segments = input.segments.len(),
        equipment = input.equipment.len(),
        routes = input.routes.len(),
        "loaded report"
    );
    Ok(input)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(msg) = init_logging(cli.log_level.as_deref()) {
        eprintln!("{msg}");
        return ExitCode::FAILURE;
    }

    let outcome = match &cli.command {
        Command::Run(args) => run(args),
        Command::Inspect(args) => inspect(args),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &RunArgs) -> Result<(), String> {
    let config = config_from_cli(&args.config)?;
    let input = load_report(&args.input)?;

    let engine = Engine::with_clock(input.segments, input.equipment, config, &StdClock)
        .map_err(|e| format!("Error building network: {e}"))?;
    let mut progress = Limit::new(args.limit);
    let (results, diagnostics) = engine.run(&input.routes, &mut progress, &StdClock);

    if args.json {
        let rows: Vec<_> = results.iter().map(RouteResult::to_row).collect();
        let json = serde_json::to_string_pretty(&rows)
            .map_err(|e| format!("Error serializing rows: {e}"))?;
        println!("{json}");
    } else {
        println!("route_id\tfrom\tto\tstatus\tbranches\tpath");
        for r in &results {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                r.route_id,
                r.from_label,
                r.to_label,
                r.status(),
                r.branch_summary,
                r.path_description,
            );
        }
    }

    if args.diagnostics {
        if args.json {
            let json = serde_json::to_string_pretty(&diagnostics)
                .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
            eprintln!("{json}");
        } else {
            eprintln!();
            eprintln!("{}", diagnostics.report());
        }
    }

    Ok(())
}

fn inspect(args: &InspectArgs) -> Result<(), String> {
    let config = config_from_cli(&args.config)?;
    let input = load_report(&args.input)?;

    let engine = Engine::with_clock(input.segments, input.equipment, config, &StdClock)
        .map_err(|e| format!("Error building network: {e}"))?;
    let network = engine.network();
    let all: Vec<usize> = (0..network.len()).collect();
    let components = detect_islands(network, &all);

    let isolated = components.iter().filter(|c| c.len() == 1).count();
    let largest = components.iter().map(|c| c.len()).max().unwrap_or(0);
    let count_kind = |kind: IslandKind| components.iter().filter(|c| c.kind == kind).count();
    let no_connectors = network
        .segments()
        .iter()
        .filter(|s| s.connection_points.is_empty() && s.connected_to.is_empty())
        .count();

    if args.json {
        let stats = serde_json::json!({
            "segments": network.len(),
            "connection_points": network.connection_point_count(),
            "edges": network.edge_count(),
            "equipment": engine.equipment().len(),
            "routes": input.routes.len(),
            "components": components.len(),
            "isolated_segments": isolated,
            "largest_component": largest,
            "tray_components": count_kind(IslandKind::Tray),
            "conduit_components": count_kind(IslandKind::Conduit),
            "mixed_components": count_kind(IslandKind::Mixed),
            "segments_without_connectors": no_connectors,
        });
        let json = serde_json::to_string_pretty(&stats)
            .map_err(|e| format!("Error serializing statistics: {e}"))?;
        println!("{json}");
    } else {
        println!("Network Statistics\n{}", "=".repeat(48));
        println!(
            "Segments: {}  |  Connection points: {}  |  Edges: {}",
            network.len(),
            network.connection_point_count(),
            network.edge_count(),
        );
        println!(
            "Equipment: {}  |  Routes: {}",
            engine.equipment().len(),
            input.routes.len()
        );
        println!(
            "Components: {} (tray {}, conduit {}, mixed {})",
            components.len(),
            count_kind(IslandKind::Tray),
            count_kind(IslandKind::Conduit),
            count_kind(IslandKind::Mixed),
        );
        println!("Largest component: {largest} segments");
        println!("Isolated segments: {isolated}");
        println!("Segments without connectors: {no_connectors}");
    }

    Ok(())
}

/// Stops the run after a fixed number of routes.
struct Limit {
    remaining: Option<usize>,
}

impl Limit {
    const fn new(limit: Option<usize>) -> Self {
        Self { remaining: limit }
    }
}

impl Progress for Limit {
    fn is_cancelled(&self) -> bool {
        self.remaining == Some(0)
    }

    fn route_finished(&mut self, index: usize, total: usize, result: &RouteResult) {
        debug!(
            route = %result.route_id,
            status = %result.status(),
            "{}/{total}",
            index + 1
        );
        if let Some(n) = self.remaining.as_mut() {
            *n = n.saturating_sub(1);
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
