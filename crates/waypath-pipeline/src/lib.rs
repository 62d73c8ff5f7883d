//! waypath-pipeline: Pure trajectory reconstruction and routing (sans-IO).
//!
//! Turns a sparsely-sampled 2D trajectory into a shortest route through
//! its waypoints:
//! reconstruction (fill missing samples) -> route optimization
//! (shortest path over the complete Euclidean graph of waypoints).
//!
//! This crate has **no I/O dependencies**: it operates on in-memory
//! samples and returns structured data. Plotting, prompting, and file
//! handling belong to callers.

pub mod diagnostics;
pub mod interpolate;
pub mod optimize;
pub mod pipeline;
pub mod reconstruct;
pub mod types;

pub use diagnostics::PipelineDiagnostics;
pub use interpolate::{Interpolator, InterpolatorKind};
pub use optimize::{path_length, shortest_path};
pub use pipeline::Pipeline;
pub use reconstruct::reconstruct;
pub use types::{
    Endpoint, PipelineConfig, PipelineError, ProcessResult, Route, Sample, SampleValue,
    StagedResult, Trajectory, Waypoint,
};

use diagnostics::Clock;

/// Run the full pipeline.
///
/// Reconstructs every missing sample with the configured interpolator,
/// then finds the shortest route between the configured endpoints.
///
/// # Errors
///
/// Returns [`PipelineError::InsufficientData`] if fewer than two samples
/// are known. Returns [`PipelineError::IndexOutOfRange`] if an explicit
/// endpoint is past the last waypoint. Returns
/// [`PipelineError::NoPathFound`] if the search cannot reach the end.
pub fn process(
    trajectory: &Trajectory,
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    // 1. Fill missing samples.
    let waypoints = reconstruct::reconstruct_with(trajectory, &config.interpolator)?;

    // 2. Shortest route between the configured endpoints.
    let start = config.start.resolve(waypoints.len());
    let end = config.end.resolve(waypoints.len());
    let route = shortest_path(&waypoints, start, end)?;

    Ok(ProcessResult { waypoints, route })
}

/// Run the full pipeline, preserving every intermediate and collecting
/// per-stage diagnostics.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_staged(
    trajectory: Trajectory,
    config: PipelineConfig,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let clock = Clock::start();
    let routed = Pipeline::new(trajectory, config).reconstruct()?.route()?;
    let (reconstruct, route) = routed.stage_diagnostics();
    let staged = routed.into_result();
    let diagnostics = PipelineDiagnostics {
        reconstruct,
        route,
        total_duration: clock.elapsed(),
    };
    Ok((staged, diagnostics))
}
