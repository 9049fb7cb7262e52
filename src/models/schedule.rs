//! Schedule model.
//!
//! A schedule is a named collection of assignments owned by whoever
//! loaded it. The analysis modules only read schedules and produce
//! reports about them; they never change a schedule's identity.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Assignment, AssignmentId, ResourceKind};

/// Publication status of a schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleStatus {
    /// Being edited.
    #[default]
    Draft,
    /// Visible to staff and students.
    Published,
    /// Retained for history only.
    Archived,
}

/// A weekly timetable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Schedule identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Publication status.
    pub status: ScheduleStatus,
    /// Slot bookings.
    pub assignments: Vec<Assignment>,
}

impl Schedule {
    /// Creates an empty draft schedule.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: ScheduleStatus::Draft,
            assignments: Vec::new(),
        }
    }

    /// Sets the status.
    pub fn with_status(mut self, status: ScheduleStatus) -> Self {
        self.status = status;
        self
    }

    /// Adds an assignment (builder form).
    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the schedule has no assignments.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Finds an assignment by id.
    pub fn assignment(&self, id: AssignmentId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.id == id)
    }

    /// All assignments booking a given resource.
    pub fn assignments_for(&self, kind: ResourceKind, resource_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.resource(kind) == Some(resource_id))
            .collect()
    }

    /// Distinct resource ids of a kind referenced by this schedule.
    pub fn resource_ids(&self, kind: ResourceKind) -> BTreeSet<&str> {
        self.assignments
            .iter()
            .filter_map(|a| a.resource(kind))
            .collect()
    }

    /// Booked minutes per resource of a kind. Malformed slots are ignored.
    pub fn booked_minutes(&self, kind: ResourceKind) -> BTreeMap<String, i64> {
        let mut busy: BTreeMap<String, i64> = BTreeMap::new();
        for a in self.assignments.iter().filter(|a| a.is_well_formed()) {
            if let Some(id) = a.resource(kind) {
                *busy.entry(id.to_string()).or_insert(0) += a.slot.duration_minutes();
            }
        }
        busy
    }

    /// Number of distinct weekdays with at least one booking.
    pub fn days_in_use(&self) -> usize {
        let mut days: Vec<_> = self.assignments.iter().map(|a| a.slot.day).collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();
        days.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeSlot;
    use chrono::Weekday;

    fn sample_schedule() -> Schedule {
        Schedule::new("S1", "Fall term")
            .with_assignment(
                Assignment::new(1, TimeSlot::parse(Weekday::Mon, "09:00", "10:00").unwrap())
                    .with_teacher("T1")
                    .with_room("R1")
                    .with_course("MATH"),
            )
            .with_assignment(
                Assignment::new(2, TimeSlot::parse(Weekday::Mon, "10:00", "11:30").unwrap())
                    .with_teacher("T1")
                    .with_room("R2")
                    .with_course("PHYS"),
            )
            .with_assignment(
                Assignment::new(3, TimeSlot::parse(Weekday::Tue, "09:00", "10:00").unwrap())
                    .with_teacher("T2")
                    .with_room("R1"),
            )
    }

    #[test]
    fn test_defaults() {
        let s = Schedule::new("S", "empty");
        assert_eq!(s.status, ScheduleStatus::Draft);
        assert!(s.is_empty());
        assert_eq!(s.days_in_use(), 0);
    }

    #[test]
    fn test_assignment_lookup() {
        let s = sample_schedule();
        assert_eq!(s.assignment(2).map(|a| a.slot.day), Some(Weekday::Mon));
        assert!(s.assignment(99).is_none());
    }

    #[test]
    fn test_assignments_for_resource() {
        let s = sample_schedule();
        assert_eq!(s.assignments_for(ResourceKind::Teacher, "T1").len(), 2);
        assert_eq!(s.assignments_for(ResourceKind::Room, "R1").len(), 2);
        assert!(s.assignments_for(ResourceKind::Room, "R9").is_empty());
    }

    #[test]
    fn test_resource_ids() {
        let s = sample_schedule();
        let teachers: Vec<_> = s.resource_ids(ResourceKind::Teacher).into_iter().collect();
        assert_eq!(teachers, vec!["T1", "T2"]);
    }

    #[test]
    fn test_booked_minutes() {
        let s = sample_schedule();
        let busy = s.booked_minutes(ResourceKind::Teacher);
        assert_eq!(busy["T1"], 150);
        assert_eq!(busy["T2"], 60);
    }

    #[test]
    fn test_days_in_use() {
        assert_eq!(sample_schedule().days_in_use(), 2);
    }
}
