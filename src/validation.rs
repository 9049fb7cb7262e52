//! Input validation for schedules.
//!
//! Checks structural integrity of a schedule before analysis. Detects:
//! - Empty schedules
//! - Duplicate assignment IDs
//! - Malformed intervals (`start >= end`)
//!
//! Defects are reported per item; one bad assignment never hides the
//! others.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::models::{AssignmentId, Schedule};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Offending assignment, if the defect belongs to one.
    pub assignment_id: Option<AssignmentId>,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// The schedule has no assignments.
    EmptySchedule,
    /// Two assignments share the same ID.
    DuplicateId,
    /// An assignment's start is not before its end.
    InvalidInterval,
}

impl ValidationError {
    fn new(
        kind: ValidationErrorKind,
        assignment_id: Option<AssignmentId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            assignment_id,
            message: message.into(),
        }
    }
}

/// Validates a schedule.
///
/// Checks:
/// 1. The schedule has at least one assignment
/// 2. No duplicate assignment IDs
/// 3. Every assignment has `start < end`
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_schedule(schedule: &Schedule) -> ValidationResult {
    let errors = schedule_defects(schedule);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Lists every defect in a schedule, ordered by assignment id then kind.
///
/// A schedule-level defect (no assignment id) sorts first.
pub fn schedule_defects(schedule: &Schedule) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if schedule.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptySchedule,
            None,
            format!("Schedule '{}' has no assignments", schedule.id),
        ));
        return errors;
    }

    let mut seen = HashSet::new();
    for a in &schedule.assignments {
        if !seen.insert(a.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                Some(a.id),
                format!("Duplicate assignment ID: {}", a.id),
            ));
        }

        if !a.is_well_formed() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidInterval,
                Some(a.id),
                format!(
                    "Assignment {} starts at {} but ends at {}",
                    a.id,
                    a.slot.start.format("%H:%M"),
                    a.slot.end.format("%H:%M")
                ),
            ));
        }
    }

    errors.sort_by(|x, y| (x.assignment_id, x.kind).cmp(&(y.assignment_id, y.kind)));
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, TimeSlot};
    use chrono::Weekday;

    fn at(id: AssignmentId, start: &str, end: &str) -> Assignment {
        Assignment::new(id, TimeSlot::parse(Weekday::Mon, start, end).unwrap())
    }

    #[test]
    fn test_valid_schedule() {
        let s = Schedule::new("S1", "ok")
            .with_assignment(at(1, "09:00", "10:00"))
            .with_assignment(at(2, "10:00", "11:00"));
        assert!(validate_schedule(&s).is_ok());
    }

    #[test]
    fn test_empty_schedule() {
        let errors = validate_schedule(&Schedule::new("S1", "empty")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::EmptySchedule);
        assert_eq!(errors[0].assignment_id, None);
    }

    #[test]
    fn test_duplicate_id() {
        let s = Schedule::new("S1", "dup")
            .with_assignment(at(7, "09:00", "10:00"))
            .with_assignment(at(7, "11:00", "12:00"));
        let errors = validate_schedule(&s).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.assignment_id == Some(7)));
    }

    #[test]
    fn test_inverted_interval() {
        let s = Schedule::new("S1", "bad").with_assignment(at(3, "11:00", "10:00"));
        let errors = validate_schedule(&s).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidInterval);
        assert!(errors[0].to_string().contains("Assignment 3"));
    }

    #[test]
    fn test_zero_length_interval() {
        let s = Schedule::new("S1", "bad").with_assignment(at(3, "10:00", "10:00"));
        let errors = validate_schedule(&s).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidInterval);
    }

    #[test]
    fn test_multiple_errors_ordered_by_id() {
        let s = Schedule::new("S1", "bad")
            .with_assignment(at(9, "12:00", "11:00"))
            .with_assignment(at(2, "10:00", "09:00"))
            .with_assignment(at(5, "09:00", "10:00"));
        let errors = validate_schedule(&s).unwrap_err();
        let ids: Vec<_> = errors.iter().map(|e| e.assignment_id).collect();
        assert_eq!(ids, vec![Some(2), Some(9)]);
    }
}
