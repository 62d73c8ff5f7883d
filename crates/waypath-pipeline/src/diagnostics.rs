//! Pipeline diagnostics: timing and counts for each stage.
//!
//! Every call to [`process_staged`](crate::process_staged) collects
//! diagnostics alongside the pipeline results. Timestamps are captured
//! via the `web-time` crate, which uses `performance.now()` on WASM and
//! `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Wall-clock timer backed by `web-time`.
#[derive(Debug, Clone, Copy)]
pub struct Clock(web_time::Instant);

impl Clock {
    /// Start timing now.
    #[must_use]
    pub fn start() -> Self {
        Self(web_time::Instant::now())
    }

    /// Time elapsed since [`Self::start`].
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: path reconstruction.
    pub reconstruct: StageDiagnostics,
    /// Stage 2: shortest-route search.
    pub route: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Path reconstruction metrics.
    Reconstruct(ReconstructMetrics),
    /// Shortest-route search metrics.
    Route(SearchMetrics),
}

/// Counts describing how a trajectory was filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconstructMetrics {
    /// Total number of samples.
    pub sample_count: usize,
    /// Samples with an observed position.
    pub known_count: usize,
    /// Missing samples between the first and last known index.
    pub interpolated_count: usize,
    /// Missing samples outside the known index span.
    pub extrapolated_count: usize,
}

/// Counters describing the work done by one shortest-route search.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchMetrics {
    /// Number of nodes in the graph.
    pub node_count: usize,
    /// Nodes extracted with a current (non-stale) distance.
    pub settled_count: usize,
    /// Candidate edges examined.
    pub relaxation_count: usize,
    /// Entries pushed onto the priority queue, including the start.
    pub pushed_count: usize,
    /// Entries discarded because a shorter distance was already known.
    pub stale_count: usize,
    /// Whether the search stopped on reaching the end node.
    pub early_exit: bool,
    /// Edges in the resulting route.
    pub hops: usize,
    /// Total length of the resulting route.
    pub distance: f64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_diagnostics() -> PipelineDiagnostics {
        PipelineDiagnostics {
            reconstruct: StageDiagnostics {
                duration: Duration::from_millis(250),
                metrics: StageMetrics::Reconstruct(ReconstructMetrics {
                    sample_count: 18,
                    known_count: 14,
                    interpolated_count: 4,
                    extrapolated_count: 0,
                }),
            },
            route: StageDiagnostics {
                duration: Duration::from_millis(125),
                metrics: StageMetrics::Route(SearchMetrics {
                    node_count: 18,
                    settled_count: 2,
                    relaxation_count: 17,
                    pushed_count: 18,
                    stale_count: 0,
                    early_exit: true,
                    hops: 1,
                    distance: 12.5,
                }),
            },
            total_duration: Duration::from_millis(500),
        }
    }

    #[test]
    fn diagnostics_serde_round_trip() {
        let diag = sample_diagnostics();
        let json = serde_json::to_string(&diag).unwrap();
        let back: PipelineDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.reconstruct.metrics, diag.reconstruct.metrics);
        assert_eq!(back.route.metrics, diag.route.metrics);
        // Binary-exact fractions of a second survive the f64 encoding.
        assert_eq!(back.reconstruct.duration, diag.reconstruct.duration);
        assert_eq!(back.total_duration, diag.total_duration);
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let stage = StageDiagnostics {
            duration: Duration::from_millis(1500),
            metrics: StageMetrics::Reconstruct(ReconstructMetrics::default()),
        };
        let value = serde_json::to_value(&stage).unwrap();
        assert!((value["duration"].as_f64().unwrap() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let json = r#"{"duration": -1.0, "metrics": {"Reconstruct": {
            "sample_count": 0, "known_count": 0,
            "interpolated_count": 0, "extrapolated_count": 0}}}"#;
        assert!(serde_json::from_str::<StageDiagnostics>(json).is_err());
    }

    #[test]
    fn clock_is_monotonic() {
        let clock = Clock::start();
        let first = clock.elapsed();
        let second = clock.elapsed();
        assert!(second >= first);
    }
}
