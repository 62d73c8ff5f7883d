//! Path reconstruction: fill missing trajectory samples.
//!
//! The `x` and `y` coordinates are treated as two independent functions
//! of the sample index. Each is fitted through the known samples with
//! the configured [`Interpolator`] and evaluated at every missing index,
//! including indices before the first or after the last known sample
//! (extrapolation). Known samples are copied through untouched.
//!
//! This is stage 1 of the pipeline, ahead of route optimization.

use log::debug;

use crate::diagnostics::ReconstructMetrics;
use crate::interpolate::{Interpolator, InterpolatorKind, MIN_KNOTS};
use crate::types::{PipelineError, SampleValue, Trajectory, Waypoint};

/// Reconstruct a complete waypoint sequence with the default cubic scheme.
///
/// # Errors
///
/// Returns [`PipelineError::InsufficientData`] if fewer than two samples
/// have a known position.
pub fn reconstruct(trajectory: &Trajectory) -> Result<Vec<Waypoint>, PipelineError> {
    reconstruct_with(trajectory, &InterpolatorKind::Cubic)
}

/// Reconstruct a complete waypoint sequence with the given interpolator.
///
/// # Errors
///
/// Returns [`PipelineError::InsufficientData`] if fewer than two samples
/// have a known position.
pub fn reconstruct_with(
    trajectory: &Trajectory,
    interpolator: &impl Interpolator,
) -> Result<Vec<Waypoint>, PipelineError> {
    reconstruct_with_metrics(trajectory, interpolator).map(|(waypoints, _)| waypoints)
}

/// Reconstruct and report counts of what was filled.
///
/// # Errors
///
/// Returns [`PipelineError::InsufficientData`] if fewer than two samples
/// have a known position.
pub fn reconstruct_with_metrics(
    trajectory: &Trajectory,
    interpolator: &impl Interpolator,
) -> Result<(Vec<Waypoint>, ReconstructMetrics), PipelineError> {
    let samples = trajectory.samples();

    let mut knots = Vec::new();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for sample in samples {
        if let SampleValue::Known(p) = sample.value {
            #[allow(clippy::cast_precision_loss)]
            let knot = sample.index as f64;
            knots.push(knot);
            xs.push(p.x);
            ys.push(p.y);
        }
    }

    if knots.len() < MIN_KNOTS {
        return Err(PipelineError::InsufficientData { known: knots.len() });
    }

    // Knots come from validated, strictly increasing indices, so fitting
    // only fails on the knot count already checked above.
    let (Some(fit_x), Some(fit_y)) = (
        interpolator.fit(&knots, &xs),
        interpolator.fit(&knots, &ys),
    ) else {
        return Err(PipelineError::InsufficientData { known: knots.len() });
    };

    let first_known = knots[0];
    let last_known = knots[knots.len() - 1];
    let mut metrics = ReconstructMetrics {
        sample_count: samples.len(),
        known_count: knots.len(),
        interpolated_count: 0,
        extrapolated_count: 0,
    };

    let waypoints = samples
        .iter()
        .map(|sample| match sample.value {
            SampleValue::Known(p) => p,
            SampleValue::Missing => {
                #[allow(clippy::cast_precision_loss)]
                let t = sample.index as f64;
                if t < first_known || t > last_known {
                    metrics.extrapolated_count += 1;
                } else {
                    metrics.interpolated_count += 1;
                }
                Waypoint::new(fit_x.evaluate(t), fit_y.evaluate(t))
            }
        })
        .collect();

    debug!(
        "reconstructed {} samples: {} known, {} interpolated, {} extrapolated",
        metrics.sample_count,
        metrics.known_count,
        metrics.interpolated_count,
        metrics.extrapolated_count,
    );

    Ok((waypoints, metrics))
}
