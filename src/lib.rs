//! School timetable validation and optimization orchestration.
//!
//! Detects conflicts among time-boxed teacher and room bookings, scores
//! timetables along weighted fitness categories, drives cancellable
//! optimization runs on a worker thread, and allocates course seats in a
//! simulate-then-commit workflow.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `TimeSlot`, `Assignment`, `ResourceRefs`,
//!   `Schedule`, and the `overlaps` predicate
//! - **`validation`**: Structural checks (empty schedule, duplicate ids, malformed intervals)
//! - **`conflict`**: `ConflictDetector` and `ConflictReport`
//! - **`fitness`**: Per-category scoring (`breakdown`) and `OutcomeReporter`
//! - **`optimize`**: `OptimizationController`, the `Solver` contract and a
//!   built-in local search
//! - **`allocation`**: Priority-driven seat allocation and `AssignmentWorkflow`
//! - **`error`**: Error types for run lifecycle and collaborator failures
//!
//! # Architecture
//!
//! Detection and scoring are pure, synchronous computations on the
//! caller's thread. Only optimization runs use a dedicated worker. The
//! solver and allocator are injected as trait objects; the crate itself
//! performs no I/O and logs only through the `log` facade.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent Research Directions in Automated Timetabling"

pub mod allocation;
pub mod conflict;
pub mod error;
pub mod fitness;
pub mod models;
pub mod optimize;
pub mod validation;
