//! Engine run metrics.
//!
//! Collected only by [`Rebulk::matches_with_metrics`](crate::Rebulk::matches_with_metrics);
//! the plain `matches` path skips the per-pattern bookkeeping.

use std::time::Duration;

use crate::matches::Matches;

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for the run.
    pub total: Duration,
    /// Cumulative time spent running patterns.
    pub patterns_total: Duration,
    /// One entry per effective pattern, in execution order.
    pub patterns: Vec<PatternMetrics>,
    /// Time spent executing rules.
    pub rules: Duration,
    /// Names of the rules whose condition fired, in execution order.
    pub fired: Vec<String>,
}

/// Timing and output count of a single pattern.
#[derive(Debug, Default, Clone)]
pub struct PatternMetrics {
    pub label: String,
    pub duration: Duration,
    /// Matches yielded before rules ran.
    pub produced: usize,
}

/// Final matches bundled with timing information.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub matches: Matches,
    pub metrics: RunMetrics,
}
