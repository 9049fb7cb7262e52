//! Optimization run result.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::RunState;
use crate::fitness::FitnessBreakdown;
use crate::models::Schedule;

/// Final, immutable outcome of one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Run identifier.
    pub run_id: Uuid,
    /// Schedule the run was started against.
    pub schedule_id: String,
    /// Terminal state.
    pub state: RunState,
    /// `true` only for [`RunState::Completed`].
    pub successful: bool,
    /// Human-readable outcome. Holds the error text for failed runs.
    pub message: String,
    /// Weighted total of the input schedule.
    pub before_score: f64,
    /// Weighted total of the best schedule (equals `before_score` on failure).
    pub after_score: f64,
    /// Wall-clock duration of the run.
    pub duration: Duration,
    /// Solver iterations performed.
    pub iterations: u64,
    /// Category breakdown of the input schedule.
    pub before: FitnessBreakdown,
    /// Category breakdown of the best schedule.
    pub after: FitnessBreakdown,
    /// Best schedule found. `None` for failed runs.
    pub best_schedule: Option<Schedule>,
}

impl OptimizationResult {
    /// `after_score - before_score`.
    pub fn improvement(&self) -> f64 {
        self.after_score - self.before_score
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        format!(
            "{:?}: score {:.4} -> {:.4} ({:+.4}) in {} iterations, {:.2}s",
            self.state,
            self.before_score,
            self.after_score,
            self.improvement(),
            self.iterations,
            self.duration.as_secs_f64()
        )
    }
}
