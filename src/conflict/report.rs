//! Conflict report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::{AssignmentId, ResourceKind, TimeSlot};
use crate::validation::ValidationError;

/// Two assignments booking the same resource at overlapping times.
///
/// `first < second` always holds (by assignment id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictPair {
    /// Which kind of resource is double-booked.
    pub kind: ResourceKind,
    /// The double-booked resource.
    pub resource_id: String,
    /// Lower assignment id.
    pub first: AssignmentId,
    /// Higher assignment id.
    pub second: AssignmentId,
    /// The shared part of the two slots.
    pub overlap: TimeSlot,
}

impl ConflictPair {
    /// Whether an assignment takes part in this conflict.
    pub fn involves(&self, id: AssignmentId) -> bool {
        self.first == id || self.second == id
    }
}

impl std::fmt::Display for ConflictPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} double-booked by assignments {} and {} ({})",
            self.kind.label(),
            self.resource_id,
            self.first,
            self.second,
            self.overlap
        )
    }
}

/// Result of scanning a schedule for conflicts and defects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// Scanned schedule.
    pub schedule_id: String,
    /// Number of assignments in the schedule (including malformed ones).
    pub total_assignments: usize,
    /// Teacher double-bookings, ordered by `(first, second)`.
    pub teacher_conflicts: Vec<ConflictPair>,
    /// Room double-bookings, ordered by `(first, second)`.
    pub room_conflicts: Vec<ConflictPair>,
    /// Assignments missing at least one of teacher/room/course.
    pub unassigned_count: usize,
    /// Assignments missing all of teacher/room/course.
    pub empty_count: usize,
    /// Structural defects found while scanning.
    pub defects: Vec<ValidationError>,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
}

impl ConflictReport {
    /// Conflicts of one resource kind.
    pub fn conflicts(&self, kind: ResourceKind) -> &[ConflictPair] {
        match kind {
            ResourceKind::Teacher => &self.teacher_conflicts,
            ResourceKind::Room => &self.room_conflicts,
        }
    }

    /// Total number of conflict pairs across all kinds.
    pub fn conflict_count(&self) -> usize {
        self.teacher_conflicts.len() + self.room_conflicts.len()
    }

    /// Whether any double-booking was found.
    pub fn has_conflicts(&self) -> bool {
        self.conflict_count() > 0
    }

    /// No conflicts, no defects, nothing unassigned.
    pub fn is_clean(&self) -> bool {
        !self.has_conflicts() && self.defects.is_empty() && self.unassigned_count == 0
    }

    /// Distinct assignment ids involved in conflicts of one kind.
    pub fn conflicting_assignment_ids(&self, kind: ResourceKind) -> BTreeSet<AssignmentId> {
        self.conflicts(kind)
            .iter()
            .flat_map(|p| [p.first, p.second])
            .collect()
    }
}
