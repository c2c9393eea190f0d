//! Shared types for the cabletrace engine.

use serde::{Deserialize, Serialize};

use crate::island_path::IslandWeightingKind;

/// A 3D point in model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    /// East-west position.
    pub x: f64,
    /// North-south position.
    pub y: f64,
    /// Elevation.
    pub z: f64,
}

impl Point3 {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx.mul_add(dx, dy.mul_add(dy, dz * dz))
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Returns `true` if every coordinate is finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub(crate) const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Axis-aligned bounding region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl BoundingBox {
    /// Create a bounding box from two corners.
    #[must_use]
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing every point, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let seed = Self::new(*first, *first);
        Some(rest.iter().fold(seed, |acc, p| acc.union(&Self::new(*p, *p))))
    }

    /// Smallest box enclosing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Center of the box.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        Point3::new(
            f64::midpoint(self.min.x, self.max.x),
            f64::midpoint(self.min.y, self.max.y),
            f64::midpoint(self.min.z, self.max.z),
        )
    }

    /// Distance from the box surface to `p`; zero when `p` is inside.
    #[must_use]
    pub fn distance_to_point(&self, p: Point3) -> f64 {
        let dx = (self.min.x - p.x).max(p.x - self.max.x).max(0.0);
        let dy = (self.min.y - p.y).max(p.y - self.max.y).max(0.0);
        let dz = (self.min.z - p.z).max(p.z - self.max.z).max(0.0);
        dx.mul_add(dx, dy.mul_add(dy, dz * dz)).sqrt()
    }

    /// Clearance between two boxes; zero when they touch or overlap.
    #[must_use]
    pub fn distance_to_box(&self, other: &Self) -> f64 {
        let dx = (other.min.x - self.max.x).max(self.min.x - other.max.x).max(0.0);
        let dy = (other.min.y - self.max.y).max(self.min.y - other.max.y).max(0.0);
        let dz = (other.min.z - self.max.z).max(self.min.z - other.max.z).max(0.0);
        dx.mul_add(dx, dy.mul_add(dy, dz * dz)).sqrt()
    }

    /// Returns `true` if both corners are finite and `min <= max` on
    /// every axis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
            && self.min.z <= self.max.z
    }
}

/// Declared type of a containment segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    /// Cable tray run.
    Tray,
    /// Conduit run.
    Conduit,
    /// Bend, tee, reducer or other fitting joining runs.
    Fitting,
}

/// Containment family used to classify transitions and islands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    /// Tray-like containment.
    Tray,
    /// Conduit-like containment.
    Conduit,
}

impl SegmentKind {
    /// The family this kind belongs to. Fittings are family-neutral.
    #[must_use]
    pub const fn family(self) -> Option<Family> {
        match self {
            Self::Tray => Some(Family::Tray),
            Self::Conduit => Some(Family::Conduit),
            Self::Fitting => None,
        }
    }
}

/// One physical unit of the containment network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Externally visible identifier, also used in path descriptions.
    pub id: String,
    /// Declared segment type.
    pub kind: SegmentKind,
    /// Physical length in model units. Must be finite and non-negative.
    pub length: f64,
    /// Spatial extent of the segment.
    pub bbox: BoundingBox,
    /// Connector locations.
    #[serde(default)]
    pub connection_points: Vec<Point3>,
    /// Identifiers of segments the source model reports as connected,
    /// independent of connector geometry.
    #[serde(default)]
    pub connected_to: Vec<String>,
    /// Explicit branch code. When absent the code is the identifier
    /// suffix after the configured separator.
    #[serde(default)]
    pub branch: Option<String>,
}

impl Segment {
    /// Create a segment with no explicit connections or branch code.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: SegmentKind,
        length: f64,
        bbox: BoundingBox,
        connection_points: Vec<Point3>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            length,
            bbox,
            connection_points,
            connected_to: Vec::new(),
            branch: None,
        }
    }

    /// Reference location used for nearest-segment and jump distances:
    /// the bounding-box centroid.
    #[must_use]
    pub fn location(&self) -> Point3 {
        self.bbox.centroid()
    }

    /// Short branch code for the branch summary.
    #[must_use]
    pub fn branch_code(&self, separator: char) -> &str {
        if let Some(ref branch) = self.branch
            && !branch.trim().is_empty()
        {
            return branch.trim();
        }
        self.id
            .rsplit_once(separator)
            .map_or(self.id.as_str(), |(_, suffix)| suffix)
            .trim()
    }

    /// Returns a description of the first data problem, if any.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if !self.length.is_finite() || self.length < 0.0 {
            return Err(format!(
                "segment {} has invalid length {}",
                self.id, self.length
            ));
        }
        if !self.bbox.is_valid() {
            return Err(format!("segment {} has an invalid bounding box", self.id));
        }
        Ok(())
    }
}

/// A possible route endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    /// Unique record identifier.
    pub id: String,
    /// Structured equipment code (preferred match field).
    #[serde(default)]
    pub structured_code: String,
    /// Display name (fallback match field).
    #[serde(default)]
    pub display_name: String,
    /// Physical location of the equipment.
    pub location: Point3,
}

impl Equipment {
    /// Label reported for a resolved endpoint: the structured code, or
    /// the display name when the code is blank.
    #[must_use]
    pub fn label(&self) -> &str {
        let code = self.structured_code.trim();
        if code.is_empty() {
            self.display_name.trim()
        } else {
            code
        }
    }
}

/// One named point-to-point cable route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Route (cable) identifier.
    pub route_id: String,
    /// Free-text source endpoint label.
    #[serde(default)]
    pub from_label: String,
    /// Free-text destination endpoint label.
    #[serde(default)]
    pub to_label: String,
    /// Segments the cable is assigned to.
    #[serde(default)]
    pub assigned_segment_ids: Vec<String>,
}

/// Everything the collaborator supplies for one report run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportInput {
    /// Physical network segments.
    #[serde(default)]
    pub segments: Vec<Segment>,
    /// Endpoint candidates.
    #[serde(default)]
    pub equipment: Vec<Equipment>,
    /// Routes to resolve, in output order.
    #[serde(default)]
    pub routes: Vec<RouteRequest>,
}

/// Configuration for the route engine.
///
/// All parameters have defaults suitable for networks modelled in
/// metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Connection points closer than this are coincident.
    pub coincidence_tolerance: f64,

    /// Jumps at or below this distance are short jumps; above it they
    /// are long jumps.
    pub jump_threshold: f64,

    /// Edge weighting used when ordering disconnected islands.
    pub island_weighting: IslandWeightingKind,

    /// Delimiter before the branch code in segment identifiers.
    pub branch_separator: char,
}

impl EngineConfig {
    /// Default coincidence tolerance (model units).
    pub const DEFAULT_COINCIDENCE_TOLERANCE: f64 = 0.01;
    /// Default short/long jump boundary (one metre).
    pub const DEFAULT_JUMP_THRESHOLD: f64 = 1.0;
    /// Default branch code separator.
    pub const DEFAULT_BRANCH_SEPARATOR: char = '-';

    /// Check invariants that `Default` upholds but deserialized or
    /// hand-built configs may not.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if a tolerance or
    /// threshold is negative or non-finite.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.coincidence_tolerance.is_finite() || self.coincidence_tolerance < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "coincidence_tolerance must be finite and >= 0, got {}",
                self.coincidence_tolerance
            )));
        }
        if !self.jump_threshold.is_finite() || self.jump_threshold < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "jump_threshold must be finite and >= 0, got {}",
                self.jump_threshold
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coincidence_tolerance: Self::DEFAULT_COINCIDENCE_TOLERANCE,
            jump_threshold: Self::DEFAULT_JUMP_THRESHOLD,
            island_weighting: IslandWeightingKind::default(),
            branch_separator: Self::DEFAULT_BRANCH_SEPARATOR,
        }
    }
}

/// Errors that abort a whole report run before any route is resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum EngineError {
    /// Engine configuration is invalid.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Two segments share an identifier.
    #[error("duplicate segment id: {0}")]
    DuplicateSegment(String),

    /// Two equipment records share an identifier.
    #[error("duplicate equipment id: {0}")]
    DuplicateEquipment(String),
}

/// Per-route problems. None of these abort the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum RouteFault {
    /// The route has no assigned segments.
    #[error("no containment assigned")]
    NoContainmentAssigned,

    /// No equipment matched an endpoint label.
    #[error("no equipment matches endpoint label {label:?}")]
    EndpointUnresolved {
        /// The label that matched nothing.
        label: String,
    },

    /// No connected path exists between the resolved endpoints.
    #[error("no connected path between endpoints")]
    Disconnected,

    /// Unexpected internal fault, typically malformed segment data.
    #[error("computation fault: {0}")]
    ComputationFault(String),
}
