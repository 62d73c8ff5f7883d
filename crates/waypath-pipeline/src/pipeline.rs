//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process`] which runs both stages in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use waypath_pipeline::{Pipeline, PipelineConfig, PipelineError, Trajectory, Waypoint};
//! # fn run() -> Result<(), PipelineError> {
//! let trajectory = Trajectory::from_values([
//!     Some(Waypoint::new(0.0, 1.0)),
//!     None,
//!     Some(Waypoint::new(2.0, 5.0)),
//! ])?;
//! let routed = Pipeline::new(trajectory, PipelineConfig::default())
//!     .reconstruct()?
//!     .route()?;
//!
//! assert_eq!(routed.route().path(), &[0, 2]);
//! let staged = routed.into_result();
//! assert_eq!(staged.waypoints.len(), 3);
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (as a `Result`, since both stages are fallible), carrying all
//! previously computed intermediates.

use crate::diagnostics::{Clock, ReconstructMetrics, SearchMetrics, StageDiagnostics, StageMetrics};
use crate::types::{PipelineConfig, PipelineError, Route, StagedResult, Trajectory, Waypoint};

/// Entry point for the incremental pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline run over `trajectory`.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(trajectory: Trajectory, config: PipelineConfig) -> Pending {
        Pending { config, trajectory }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`reconstruct`](Self::reconstruct) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .reconstruct() to continue"]
pub struct Pending {
    config: PipelineConfig,
    trajectory: Trajectory,
}

impl Pending {
    /// The input trajectory.
    #[must_use]
    pub const fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Fill missing samples and advance to the [`Reconstructed`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InsufficientData`] if fewer than two
    /// samples have a known position.
    pub fn reconstruct(self) -> Result<Reconstructed, PipelineError> {
        let clock = Clock::start();
        let (waypoints, metrics) =
            crate::reconstruct::reconstruct_with_metrics(&self.trajectory, &self.config.interpolator)?;
        Ok(Reconstructed {
            config: self.config,
            trajectory: self.trajectory,
            waypoints,
            diagnostics: (clock.elapsed(), metrics),
        })
    }
}

// ───────────────────────── Stage 1: Reconstructed ────────────────────

/// Pipeline state after path reconstruction.
///
/// Call [`route`](Self::route) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing; call .route() to continue"]
pub struct Reconstructed {
    config: PipelineConfig,
    trajectory: Trajectory,
    waypoints: Vec<Waypoint>,
    diagnostics: (std::time::Duration, ReconstructMetrics),
}

impl Reconstructed {
    /// One waypoint per trajectory sample.
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Counts of known, interpolated, and extrapolated samples.
    #[must_use]
    pub const fn metrics(&self) -> ReconstructMetrics {
        self.diagnostics.1
    }

    /// Search for the shortest route between the configured endpoints
    /// and advance to the [`Routed`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexOutOfRange`] if an explicit
    /// endpoint index is past the last waypoint, or
    /// [`PipelineError::NoPathFound`] if the search cannot reach the end.
    pub fn route(self) -> Result<Routed, PipelineError> {
        let len = self.waypoints.len();
        let start = self.config.start.resolve(len);
        let end = self.config.end.resolve(len);

        let clock = Clock::start();
        let (route, metrics) =
            crate::optimize::shortest_path_with_metrics(&self.waypoints, start, end)?;
        Ok(Routed {
            trajectory: self.trajectory,
            waypoints: self.waypoints,
            route,
            reconstruct: self.diagnostics,
            search: (clock.elapsed(), metrics),
        })
    }
}

// ───────────────────────── Stage 2: Routed ───────────────────────────

/// Pipeline state after the route search; this is the final stage.
///
/// Call [`into_result`](Self::into_result) to extract the
/// [`StagedResult`].
#[must_use = "call .into_result() to extract the StagedResult"]
pub struct Routed {
    trajectory: Trajectory,
    waypoints: Vec<Waypoint>,
    route: Route,
    reconstruct: (std::time::Duration, ReconstructMetrics),
    search: (std::time::Duration, SearchMetrics),
}

impl Routed {
    /// One waypoint per trajectory sample.
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// The shortest route between the configured endpoints.
    #[must_use]
    pub const fn route(&self) -> &Route {
        &self.route
    }

    /// Counters from the route search.
    #[must_use]
    pub const fn metrics(&self) -> SearchMetrics {
        self.search.1
    }

    /// Per-stage timing and metrics for both stages.
    #[must_use]
    pub fn stage_diagnostics(&self) -> (StageDiagnostics, StageDiagnostics) {
        (
            StageDiagnostics {
                duration: self.reconstruct.0,
                metrics: StageMetrics::Reconstruct(self.reconstruct.1),
            },
            StageDiagnostics {
                duration: self.search.0,
                metrics: StageMetrics::Route(self.search.1),
            },
        )
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            trajectory: self.trajectory,
            waypoints: self.waypoints,
            route: self.route,
        }
    }
}
