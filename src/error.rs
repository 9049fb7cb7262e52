//! Error types.
//!
//! Data problems inside a schedule are not errors: they are reported as
//! [`ValidationError`](crate::validation::ValidationError)s inside a
//! [`ConflictReport`](crate::conflict::ConflictReport). The types here cover
//! run lifecycle failures and collaborator failures.

use chrono::NaiveTime;
use thiserror::Error;
use uuid::Uuid;

use crate::allocation::{AllocationDecision, RawAllocationOutcome};
use crate::fitness::FitnessCategory;
use crate::optimize::HeuristicId;

/// Invalid [`OptimizationConfig`](crate::optimize::OptimizationConfig).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// `time_budget` is zero.
    #[error("time budget must be greater than zero")]
    ZeroTimeBudget,
    /// `enabled_heuristics` is empty.
    #[error("at least one heuristic must be enabled")]
    NoHeuristics,
    /// A category weight is negative, NaN or infinite.
    #[error("weight for {category} must be finite and non-negative, got {weight}")]
    InvalidWeight {
        category: FitnessCategory,
        weight: f64,
    },
    /// The school day does not start before it ends.
    #[error("school day must start before it ends ({start} >= {end})")]
    InvalidSchoolDay { start: NaiveTime, end: NaiveTime },
    /// `max_iterations` is zero.
    #[error("max_iterations must be greater than zero")]
    ZeroIterations,
    /// `progress_interval` is zero.
    #[error("progress_interval must be greater than zero")]
    ZeroProgressInterval,
    /// `target_fitness` lies outside `[0, 1]`.
    #[error("target fitness must lie in [0, 1], got {0}")]
    InvalidTargetFitness(f64),
    /// The configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),
}

/// Failure to start an optimization run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The configuration was rejected before any worker was spawned.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The schedule already has a run in progress.
    #[error("schedule '{schedule_id}' already has an active optimization run ({run_id})")]
    AlreadyActive { schedule_id: String, run_id: Uuid },
    /// The OS refused to create the worker thread.
    #[error("failed to spawn optimization worker: {0}")]
    Spawn(#[from] std::io::Error),
    /// The worker exited before signalling that it started.
    #[error("optimization worker exited before it started running")]
    WorkerLost,
}

/// Failure reported by a [`Solver`](crate::optimize::Solver).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// None of the enabled heuristics is implemented by the solver.
    #[error("none of the enabled heuristics {0:?} is supported by this solver")]
    UnsupportedHeuristics(Vec<HeuristicId>),
    /// The solver gave up.
    #[error("solver failed: {0}")]
    Failed(String),
    /// The solver panicked.
    #[error("solver panicked: {0}")]
    Panicked(String),
}

/// Failure reported by an [`Allocator`](crate::allocation::Allocator).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    /// Persisting an approval or waitlist entry failed.
    #[error("enrollment store error: {0}")]
    Store(String),
    /// A commit stopped partway. Writes made before the failure are kept.
    #[error("commit stopped after {} persisted decisions: {cause}", .persisted.len())]
    PartialCommit {
        /// The full plan the commit was writing.
        planned: Box<RawAllocationOutcome>,
        /// Decisions that reached the store, in write order.
        persisted: Vec<AllocationDecision>,
        /// The store failure that stopped the commit.
        cause: String,
    },
}
