use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for the simulated digital check-in policy. The fractions and
/// stagger intervals are demo tuning, not product requirements; the shape
/// that matters is that a session start marks a larger slice of the
/// remaining roster than a resume, and both are staggered over time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Fraction of the remaining roster to auto-mark on session start.
    pub start_fraction: f64,
    /// Delay between consecutive auto-marks triggered by start.
    pub start_stagger: Duration,
    /// Fraction of the then-remaining roster to auto-mark on resume.
    pub resume_fraction: f64,
    /// Delay between consecutive auto-marks triggered by resume.
    pub resume_stagger: Duration,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            start_fraction: 0.20,
            start_stagger: Duration::from_millis(800),
            resume_fraction: 0.10,
            resume_stagger: Duration::from_millis(1000),
        }
    }
}
