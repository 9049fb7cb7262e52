//! Conversion of raw solver output into an [`OptimizationResult`].

use std::time::Duration;
use uuid::Uuid;

use super::{FitnessBreakdown, FitnessEvaluator};
use crate::error::SolverError;
use crate::optimize::{OptimizationResult, RawOutcome, RunState};

/// Builds final results from solver outcomes.
///
/// The "after" breakdown is always recomputed from the returned schedule,
/// so the reported scores do not depend on the solver's own bookkeeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutcomeReporter;

impl OutcomeReporter {
    /// Creates a reporter.
    pub fn new() -> Self {
        Self
    }

    /// Terminal state for a solver outcome.
    ///
    /// Errors win over cancellation; a solver that returns normally after a
    /// cancellation request counts as cancelled.
    pub fn terminal_state(outcome: &Result<RawOutcome, SolverError>, cancelled: bool) -> RunState {
        match outcome {
            Err(_) => RunState::Failed,
            Ok(_) if cancelled => RunState::Cancelled,
            Ok(_) => RunState::Completed,
        }
    }

    /// Builds the result of a run.
    ///
    /// On failure `after` equals `before` and no schedule is carried.
    #[allow(clippy::too_many_arguments)]
    pub fn report(
        &self,
        run_id: Uuid,
        schedule_id: &str,
        evaluator: &FitnessEvaluator,
        before: FitnessBreakdown,
        outcome: Result<RawOutcome, SolverError>,
        state: RunState,
        duration: Duration,
    ) -> OptimizationResult {
        match outcome {
            Ok(raw) => {
                let after = evaluator.evaluate(&raw.schedule);
                let message = match state {
                    RunState::Cancelled => format!(
                        "Optimization cancelled after {} iterations; best schedule so far retained",
                        raw.iterations
                    ),
                    _ => format!(
                        "Optimization completed after {} iterations ({:?})",
                        raw.iterations, raw.stop_reason
                    ),
                };
                OptimizationResult {
                    run_id,
                    schedule_id: schedule_id.to_string(),
                    state,
                    successful: state == RunState::Completed,
                    message,
                    before_score: before.total,
                    after_score: after.total,
                    duration,
                    iterations: raw.iterations,
                    before,
                    after,
                    best_schedule: Some(raw.schedule),
                }
            }
            Err(err) => Self::failed(run_id, schedule_id, before, err.to_string(), duration),
        }
    }

    /// Result of a run that produced no outcome.
    pub fn failed(
        run_id: Uuid,
        schedule_id: &str,
        before: FitnessBreakdown,
        message: String,
        duration: Duration,
    ) -> OptimizationResult {
        OptimizationResult {
            run_id,
            schedule_id: schedule_id.to_string(),
            state: RunState::Failed,
            successful: false,
            message,
            before_score: before.total,
            after_score: before.total,
            duration,
            iterations: 0,
            after: before.clone(),
            before,
            best_schedule: None,
        }
    }
}
