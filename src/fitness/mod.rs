//! Schedule fitness and run outcome reporting.
//!
//! [`breakdown`] scores any schedule along the weighted categories of an
//! [`OptimizationConfig`](crate::optimize::OptimizationConfig), whether or
//! not it was ever optimized. [`OutcomeReporter`] turns a solver outcome
//! into the final [`OptimizationResult`](crate::optimize::OptimizationResult).
//!
//! Conflict categories are derived from the
//! [`ConflictDetector`](crate::conflict::ConflictDetector); the detector
//! knows nothing about fitness.
//!
//! # Constraint weights
//!
//! | Kind | Default weight | Categories |
//! |------|----------------|------------|
//! | Hard | 1000 | TeacherConflicts, RoomConflicts, Completeness |
//! | Soft | 100 | TeacherLoadBalance, RoomUtilization |

mod breakdown;
mod category;
mod outcome;

pub use breakdown::{breakdown, FitnessBreakdown, FitnessEvaluator};
pub use category::{ConstraintKind, FitnessCategory};
pub use outcome::OutcomeReporter;
