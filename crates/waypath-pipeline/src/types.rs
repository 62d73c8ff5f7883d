//! Shared types for the waypath trajectory pipeline.

use serde::{Deserialize, Serialize};

use crate::interpolate::InterpolatorKind;

/// A resolved 2D coordinate along a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Waypoint {
    /// Create a new waypoint.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another waypoint.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another waypoint.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Returns `true` if both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// The value recorded for a single trajectory sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleValue {
    /// The position was observed.
    Known(Waypoint),
    /// The position was not recorded and must be reconstructed.
    Missing,
}

impl SampleValue {
    /// The observed waypoint, if any.
    #[must_use]
    pub const fn known(self) -> Option<Waypoint> {
        match self {
            Self::Known(p) => Some(p),
            Self::Missing => None,
        }
    }

    /// Returns `true` if this sample has no recorded position.
    #[must_use]
    pub const fn is_missing(self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl From<Option<Waypoint>> for SampleValue {
    fn from(value: Option<Waypoint>) -> Self {
        value.map_or(Self::Missing, Self::Known)
    }
}

/// One position in a trajectory: its sequence index and recorded value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Zero-based sequence position.
    pub index: usize,
    /// Observed position or [`SampleValue::Missing`].
    pub value: SampleValue,
}

impl Sample {
    /// A sample with an observed position.
    #[must_use]
    pub const fn known(index: usize, x: f64, y: f64) -> Self {
        Self {
            index,
            value: SampleValue::Known(Waypoint::new(x, y)),
        }
    }

    /// A sample whose position was not recorded.
    #[must_use]
    pub const fn missing(index: usize) -> Self {
        Self {
            index,
            value: SampleValue::Missing,
        }
    }
}

/// An ordered, contiguously indexed sequence of samples.
///
/// Indices are exactly `0..len()`. Known coordinates are finite. The
/// sequence holds at least two samples, though it may still have too
/// few known positions to reconstruct (that is reported by
/// [`reconstruct`](crate::reconstruct::reconstruct), not here).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory(Vec<Sample>);

impl Trajectory {
    /// Minimum number of samples in a trajectory.
    pub const MIN_SAMPLES: usize = 2;

    /// Validate and wrap a sequence of samples.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidTrajectory`] if there are fewer
    /// than [`Self::MIN_SAMPLES`] samples, if sample `i` does not carry
    /// index `i`, or if a known coordinate is NaN or infinite.
    pub fn new(samples: Vec<Sample>) -> Result<Self, PipelineError> {
        if samples.len() < Self::MIN_SAMPLES {
            return Err(PipelineError::InvalidTrajectory(format!(
                "expected at least {} samples, got {}",
                Self::MIN_SAMPLES,
                samples.len()
            )));
        }
        for (position, sample) in samples.iter().enumerate() {
            if sample.index != position {
                return Err(PipelineError::InvalidTrajectory(format!(
                    "sample at position {position} has index {}",
                    sample.index
                )));
            }
            if let SampleValue::Known(p) = sample.value
                && !p.is_finite()
            {
                return Err(PipelineError::InvalidTrajectory(format!(
                    "sample {position} has a non-finite coordinate ({}, {})",
                    p.x, p.y
                )));
            }
        }
        Ok(Self(samples))
    }

    /// Build a trajectory from per-index values, assigning indices `0..n`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::new`], minus index gaps.
    pub fn from_values<I, V>(values: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = V>,
        V: Into<SampleValue>,
    {
        let samples = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| Sample {
                index,
                value: value.into(),
            })
            .collect();
        Self::new(samples)
    }

    /// Returns the number of samples.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a validated trajectory; provided for symmetry
    /// with [`Self::len`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a slice of all samples.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.0
    }

    /// Number of samples with an observed position.
    #[must_use]
    pub fn known_count(&self) -> usize {
        self.0.iter().filter(|s| !s.value.is_missing()).count()
    }

    /// Consumes the trajectory and returns the underlying samples.
    #[must_use]
    pub fn into_samples(self) -> Vec<Sample> {
        self.0
    }
}

impl<'de> Deserialize<'de> for Trajectory {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let samples = Vec::<Sample>::deserialize(deserializer)?;
        Self::new(samples).map_err(serde::de::Error::custom)
    }
}

/// A shortest route through a waypoint set.
///
/// The path is never empty and the distance is finite and non-negative.
/// Deserialization rejects values that break either rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    path: Vec<usize>,
    distance: f64,
}

impl Route {
    pub(crate) const fn new(path: Vec<usize>, distance: f64) -> Self {
        Self { path, distance }
    }

    /// Node indices from start to end, inclusive of both.
    #[must_use]
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// Total Euclidean length of the route.
    #[must_use]
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// Number of edges traversed (`0` when start equals end).
    #[must_use]
    pub const fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// The coordinates visited by this route.
    ///
    /// `nodes` must be the waypoint set the route was computed over.
    /// Indices that fall outside `nodes` are skipped.
    #[must_use]
    pub fn waypoints(&self, nodes: &[Waypoint]) -> Vec<Waypoint> {
        self.path
            .iter()
            .filter_map(|&i| nodes.get(i).copied())
            .collect()
    }

    /// Consumes the route and returns the index path.
    #[must_use]
    pub fn into_path(self) -> Vec<usize> {
        self.path
    }
}

impl<'de> Deserialize<'de> for Route {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            path: Vec<usize>,
            distance: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        if raw.path.is_empty() {
            return Err(serde::de::Error::custom("route path must not be empty"));
        }
        if !raw.distance.is_finite() || raw.distance < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "route distance must be finite and non-negative, got {}",
                raw.distance
            )));
        }
        Ok(Self::new(raw.path, raw.distance))
    }
}

/// Selects one end of the route relative to the waypoint set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// The first waypoint (index `0`).
    First,
    /// The last waypoint (index `len - 1`).
    Last,
    /// An explicit waypoint index.
    Index(usize),
}

impl Endpoint {
    /// Resolve to a concrete index for a waypoint set of `len` nodes.
    ///
    /// Range checking is left to
    /// [`shortest_path`](crate::optimize::shortest_path); an empty set
    /// resolves [`Self::Last`] to `0`.
    #[must_use]
    pub const fn resolve(self, len: usize) -> usize {
        match self {
            Self::First => 0,
            Self::Last => len.saturating_sub(1),
            Self::Index(i) => i,
        }
    }
}

/// Configuration for the trajectory pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Which interpolation scheme fills missing samples.
    pub interpolator: InterpolatorKind,

    /// Where the route starts.
    pub start: Endpoint,

    /// Where the route ends.
    pub end: Endpoint,
}

impl PipelineConfig {
    /// Default interpolation scheme.
    pub const DEFAULT_INTERPOLATOR: InterpolatorKind = InterpolatorKind::Cubic;

    /// Default route start.
    pub const DEFAULT_START: Endpoint = Endpoint::First;

    /// Default route end.
    pub const DEFAULT_END: Endpoint = Endpoint::Last;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            interpolator: Self::DEFAULT_INTERPOLATOR,
            start: Self::DEFAULT_START,
            end: Self::DEFAULT_END,
        }
    }
}

/// Output of the full pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// One waypoint per trajectory sample.
    pub waypoints: Vec<Waypoint>,

    /// Shortest route between the configured endpoints.
    pub route: Route,
}

/// Result of running the pipeline with every stage output preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedResult {
    /// Stage 0: the validated input trajectory.
    pub trajectory: Trajectory,
    /// Stage 1: reconstructed waypoints.
    pub waypoints: Vec<Waypoint>,
    /// Stage 2: shortest route over the waypoints.
    pub route: Route,
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum PipelineError {
    /// Fewer than two samples have an observed position.
    #[error("need at least 2 known samples to interpolate, found {known}")]
    InsufficientData {
        /// Number of known samples found.
        known: usize,
    },

    /// A route endpoint does not name a waypoint.
    #[error("index {index} is out of range for {len} waypoints")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of waypoints.
        len: usize,
    },

    /// The search could not reach the end node.
    #[error("no path from {start} to {end}")]
    NoPathFound {
        /// Route start index.
        start: usize,
        /// Route end index.
        end: usize,
    },

    /// The trajectory violates a structural invariant.
    #[error("invalid trajectory: {0}")]
    InvalidTrajectory(String),
}
