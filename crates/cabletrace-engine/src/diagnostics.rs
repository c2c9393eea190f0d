//! Run diagnostics: counts and timings for one report run.
//!
//! The engine never reads the system clock itself. Callers pass a
//! [`Clock`], so the engine stays free of platform time sources and
//! tests can run without one.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resolve::RouteStatus;

/// Source of monotonic timestamps.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Capture the current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// A clock that never advances. All measured durations are zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClock;

impl Clock for NoClock {
    type Instant = ();

    fn now(&self) {}

    fn elapsed(&self, _since: &()) -> Duration {
        Duration::ZERO
    }
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Number of routes that finished in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Routes with nothing assigned.
    pub pending: usize,
    /// Routes with a connected path.
    pub confirmed: usize,
    /// Routes stitched across islands.
    pub unconfirmed_virtual: usize,
    /// Routes with one resolved endpoint.
    pub partially_confirmed: usize,
    /// Routes that failed.
    pub error: usize,
}

impl StatusCounts {
    /// Count one more route in `status`.
    pub const fn record(&mut self, status: RouteStatus) {
        match status {
            RouteStatus::Pending => self.pending += 1,
            RouteStatus::Confirmed => self.confirmed += 1,
            RouteStatus::UnconfirmedVirtual => self.unconfirmed_virtual += 1,
            RouteStatus::PartiallyConfirmed => self.partially_confirmed += 1,
            RouteStatus::Error => self.error += 1,
        }
    }

    /// Count for a single status.
    #[must_use]
    pub const fn get(&self, status: RouteStatus) -> usize {
        match status {
            RouteStatus::Pending => self.pending,
            RouteStatus::Confirmed => self.confirmed,
            RouteStatus::UnconfirmedVirtual => self.unconfirmed_virtual,
            RouteStatus::PartiallyConfirmed => self.partially_confirmed,
            RouteStatus::Error => self.error,
        }
    }

    /// Sum over all statuses.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending
            + self.confirmed
            + self.unconfirmed_virtual
            + self.partially_confirmed
            + self.error
    }
}

/// Diagnostics collected from a single [`Engine::run`](crate::Engine::run).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    /// Segments in the network.
    pub segment_count: usize,
    /// Finite connection points indexed for coincidence queries.
    pub connection_point_count: usize,
    /// Adjacency edges in the network.
    pub edge_count: usize,
    /// Equipment records available for endpoint matching.
    pub equipment_count: usize,
    /// Routes submitted.
    pub routes_total: usize,
    /// Routes that produced a result row before the run stopped.
    pub routes_processed: usize,
    /// Whether the run stopped early on a cancellation request.
    pub cancelled: bool,
    /// Per-status tally of processed routes.
    pub status_counts: StatusCounts,
    /// Time spent building the network.
    #[serde(with = "duration_serde")]
    pub build_duration: Duration,
    /// Time spent in the route loop.
    #[serde(with = "duration_serde")]
    pub route_duration: Duration,
}

impl RunDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Run Diagnostics\n{}", "=".repeat(48)));
        lines.push(format!(
            "Network: {} segments, {} connection points, {} edges",
            self.segment_count, self.connection_point_count, self.edge_count,
        ));
        lines.push(format!("Equipment: {}", self.equipment_count));
        lines.push(format!(
            "Routes: {}/{} processed{}",
            self.routes_processed,
            self.routes_total,
            if self.cancelled { " (cancelled)" } else { "" },
        ));
        lines.push(format!(
            "Build: {:.3}ms  |  Routes: {:.3}ms",
            duration_ms(self.build_duration),
            duration_ms(self.route_duration),
        ));
        lines.push(String::new());

        lines.push(format!("{:<24} {:>8}", "Status", "Routes"));
        lines.push("-".repeat(33));
        for status in RouteStatus::ALL {
            lines.push(format!(
                "{:<24} {:>8}",
                status.to_string(),
                self.status_counts.get(status)
            ));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to fractional milliseconds.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
