//! Run lifecycle states and progress events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an optimization run.
///
/// ```text
/// Pending → Running → { Completed, Cancelled, Failed }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// Accepted, worker not yet iterating.
    Pending,
    /// Worker is iterating.
    Running,
    /// Solver finished normally.
    Completed,
    /// Solver stopped after observing a cancellation request.
    Cancelled,
    /// Solver returned an error or panicked.
    Failed,
}

impl RunState {
    /// Whether the run has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Cancelled | RunState::Failed
        )
    }
}

/// Incremental progress of a running optimization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Run that produced the report.
    pub run_id: Uuid,
    /// Completion fraction in `[0, 1]`, non-decreasing within a run.
    pub fraction: f64,
    /// Best weighted score seen so far.
    pub best_score: f64,
    /// Solver iteration at which the report was made.
    pub iteration: u64,
}

/// Callback payload delivered from the worker.
///
/// `Finished` is always the last event of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Incremental progress.
    Progress(Progress),
    /// Terminal state reached.
    Finished {
        run_id: Uuid,
        state: RunState,
        message: String,
    },
}

/// Filters raw solver fractions into a monotonic stream below 1.0.
///
/// Fraction 1.0 is reserved for the controller's own completion report.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProgressGate {
    last: Option<f64>,
}

impl ProgressGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the fraction to publish, or `None` to drop the report.
    pub(crate) fn admit(&mut self, fraction: f64) -> Option<f64> {
        if fraction.is_nan() {
            return None;
        }
        let clamped = fraction.clamp(0.0, 1.0);
        if clamped >= 1.0 {
            return None;
        }
        let admitted = match self.last {
            Some(last) => last.max(clamped),
            None => clamped,
        };
        self.last = Some(admitted);
        Some(admitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!RunState::Pending.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Cancelled.is_terminal());
        assert!(RunState::Failed.is_terminal());
    }

    #[test]
    fn test_gate_is_monotonic() {
        let mut gate = ProgressGate::new();
        assert_eq!(gate.admit(0.2), Some(0.2));
        assert_eq!(gate.admit(0.1), Some(0.2));
        assert_eq!(gate.admit(0.5), Some(0.5));
    }

    #[test]
    fn test_gate_clamps_and_holds_back_completion() {
        let mut gate = ProgressGate::new();
        assert_eq!(gate.admit(-3.0), Some(0.0));
        assert_eq!(gate.admit(1.0), None);
        assert_eq!(gate.admit(7.0), None);
        assert_eq!(gate.admit(f64::NAN), None);
        assert_eq!(gate.admit(0.99), Some(0.99));
    }
}
