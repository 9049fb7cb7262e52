//! Optimization runs.
//!
//! An [`OptimizationController`] executes an opaque [`Solver`] against a
//! schedule on a dedicated worker thread. Callers start a run, optionally
//! observe [`RunEvent`]s, cancel cooperatively, and wait for the
//! [`OptimizationResult`].
//!
//! # Run states
//!
//! ```text
//! Pending → Running → { Completed, Cancelled, Failed }
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use u_timetable::models::Schedule;
//! use u_timetable::optimize::{LocalSearchSolver, OptimizationConfig, OptimizationController};
//!
//! let controller = OptimizationController::new(Arc::new(LocalSearchSolver::new()));
//! let schedule = Schedule::new("S1", "Fall");
//! let handle = controller.start(&schedule, OptimizationConfig::default()).unwrap();
//! let result = handle.wait();
//! println!("{}", result.summary());
//! ```

mod cancel;
mod config;
mod controller;
mod local_search;
mod progress;
mod result;
mod solver;

pub use cancel::CancellationToken;
pub use config::{HeuristicId, OptimizationConfig, SchoolDay};
pub use controller::{OptimizationController, RunHandle};
pub use local_search::{LocalSearchSolver, COOLING_RATE, INITIAL_TEMPERATURE};
pub use progress::{Progress, RunEvent, RunState};
pub use result::OptimizationResult;
pub use solver::{RawOutcome, SolveContext, Solver, StopReason};

pub(crate) use progress::ProgressGate;
