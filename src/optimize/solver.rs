//! Solver invocation contract.
//!
//! The controller treats the solver as an opaque capability: it hands over a
//! read-only schedule, the run configuration and a [`SolveContext`], and
//! receives a [`RawOutcome`] or a [`SolverError`].

use serde::{Deserialize, Serialize};

use super::{CancellationToken, OptimizationConfig};
use crate::error::SolverError;
use crate::models::Schedule;

/// Why a solver stopped iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// No improvement within `stagnation_limit` iterations.
    Stagnated,
    /// `max_iterations` reached.
    IterationLimit,
    /// `time_budget` exhausted.
    TimeBudget,
    /// `target_fitness` reached.
    TargetReached,
    /// Cancellation observed at an iteration boundary.
    Cancelled,
}

/// Unprocessed solver output.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutcome {
    /// Best schedule found. Same assignment ids as the input.
    pub schedule: Schedule,
    /// Weighted score of `schedule` as seen by the solver.
    pub best_score: f64,
    /// Iterations performed.
    pub iterations: u64,
    /// Why the solver stopped.
    pub stop_reason: StopReason,
}

/// Per-run context handed to a solver.
///
/// Carries the cancellation token and the progress sink. Solvers should
/// poll [`SolveContext::is_cancelled`] at every iteration boundary.
pub struct SolveContext<'a> {
    token: CancellationToken,
    sink: &'a mut dyn FnMut(f64, f64, u64),
}

impl<'a> SolveContext<'a> {
    /// Creates a context reporting into `sink(fraction, best_score, iteration)`.
    pub fn new(token: CancellationToken, sink: &'a mut dyn FnMut(f64, f64, u64)) -> Self {
        Self { token, sink }
    }

    /// Whether the run was asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Reports progress. Returns `false` (and drops the report) once
    /// cancellation was requested, so no progress follows a cancel.
    pub fn report(&mut self, fraction: f64, best_score: f64, iteration: u64) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        (self.sink)(fraction, best_score, iteration);
        true
    }
}

/// Opaque optimization capability.
///
/// Implementations must not mutate shared state reachable from the input
/// schedule; they return a new schedule in [`RawOutcome`].
pub trait Solver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Optimizes `schedule` under `config`.
    fn solve(
        &self,
        schedule: &Schedule,
        config: &OptimizationConfig,
        ctx: &mut SolveContext<'_>,
    ) -> Result<RawOutcome, SolverError>;
}
