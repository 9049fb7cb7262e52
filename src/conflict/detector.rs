//! Pairwise double-booking detection.
//!
//! # Algorithm
//! 1. Order assignments by id (stable for duplicates).
//! 2. Bucket well-formed assignments by weekday; slots on different days
//!    can never overlap.
//! 3. Compare every unordered pair `(i, j)`, `i < j`, within a bucket. A pair
//!    that overlaps and shares a teacher is a teacher conflict; independently,
//!    a shared room is a room conflict.
//! 4. Classify every assignment (malformed ones included) as unassigned/empty.
//!
//! # Complexity
//! O(n²) pair comparisons in the worst case (all slots on one day).

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::{ConflictPair, ConflictReport};
use crate::models::{Assignment, ResourceKind, Schedule};
use crate::validation::schedule_defects;

/// Scans schedules for double-bookings, missing assignments and defects.
///
/// Pure: reads the schedule, writes nothing.
///
/// # Example
/// ```
/// use chrono::Weekday;
/// use u_timetable::conflict::ConflictDetector;
/// use u_timetable::models::{Assignment, Schedule, TimeSlot};
///
/// let schedule = Schedule::new("S1", "Fall")
///     .with_assignment(
///         Assignment::new(1, TimeSlot::parse(Weekday::Mon, "09:00", "10:00").unwrap())
///             .with_teacher("T1"),
///     )
///     .with_assignment(
///         Assignment::new(2, TimeSlot::parse(Weekday::Mon, "09:30", "10:30").unwrap())
///             .with_teacher("T1"),
///     );
///
/// let report = ConflictDetector::new().detect(&schedule);
/// assert_eq!(report.teacher_conflicts.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    /// Creates a detector.
    pub fn new() -> Self {
        Self
    }

    /// Scans a schedule, stamping the report with the current time.
    pub fn detect(&self, schedule: &Schedule) -> ConflictReport {
        self.detect_at(schedule, Utc::now())
    }

    /// Scans a schedule with an explicit report timestamp.
    pub fn detect_at(&self, schedule: &Schedule, generated_at: DateTime<Utc>) -> ConflictReport {
        let mut ordered: Vec<&Assignment> = schedule.assignments.iter().collect();
        ordered.sort_by_key(|a| a.id);

        let mut by_day: BTreeMap<u32, Vec<&Assignment>> = BTreeMap::new();
        for a in ordered.iter().filter(|a| a.is_well_formed()) {
            by_day
                .entry(a.slot.day.num_days_from_monday())
                .or_default()
                .push(a);
        }

        let mut teacher_conflicts = Vec::new();
        let mut room_conflicts = Vec::new();

        for bucket in by_day.values() {
            for (i, a) in bucket.iter().enumerate() {
                for b in &bucket[i + 1..] {
                    // Duplicate ids are reported as defects, not paired.
                    if a.id == b.id {
                        continue;
                    }
                    let Some(overlap) = a.slot.intersection(&b.slot) else {
                        continue;
                    };
                    for kind in ResourceKind::ALL {
                        if !a.collides_on(b, kind) {
                            continue;
                        }
                        let pair = ConflictPair {
                            kind,
                            resource_id: a.resource(kind).unwrap_or_default().to_string(),
                            first: a.id.min(b.id),
                            second: a.id.max(b.id),
                            overlap,
                        };
                        match kind {
                            ResourceKind::Teacher => teacher_conflicts.push(pair),
                            ResourceKind::Room => room_conflicts.push(pair),
                        }
                    }
                }
            }
        }

        teacher_conflicts.sort_by_key(|p| (p.first, p.second));
        room_conflicts.sort_by_key(|p| (p.first, p.second));

        let unassigned_count = schedule.assignments.iter().filter(|a| a.is_unassigned()).count();
        let empty_count = schedule.assignments.iter().filter(|a| a.is_empty()).count();

        ConflictReport {
            schedule_id: schedule.id.clone(),
            total_assignments: schedule.assignment_count(),
            teacher_conflicts,
            room_conflicts,
            unassigned_count,
            empty_count,
            defects: schedule_defects(schedule),
            generated_at,
        }
    }
}

/// Scans a schedule with a default [`ConflictDetector`].
pub fn detect(schedule: &Schedule) -> ConflictReport {
    ConflictDetector::new().detect(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentId, TimeSlot};
    use crate::validation::ValidationErrorKind;
    use chrono::{TimeZone, Weekday};

    fn at(id: AssignmentId, day: Weekday, start: &str, end: &str) -> Assignment {
        Assignment::new(id, TimeSlot::parse(day, start, end).unwrap())
    }

    fn full(id: AssignmentId, day: Weekday, start: &str, end: &str, t: &str, r: &str) -> Assignment {
        at(id, day, start, end)
            .with_teacher(t)
            .with_room(r)
            .with_course(format!("C{id}"))
    }

    #[test]
    fn test_touching_intervals_do_not_conflict() {
        let s = Schedule::new("S1", "touch")
            .with_assignment(full(1, Weekday::Mon, "09:00", "10:00", "T", "R1"))
            .with_assignment(full(2, Weekday::Mon, "10:00", "11:00", "T", "R1"));
        let report = detect(&s);
        assert!(report.teacher_conflicts.is_empty());
        assert!(report.room_conflicts.is_empty());
    }

    #[test]
    fn test_overlap_triggers_teacher_conflict_only() {
        let s = Schedule::new("S1", "overlap")
            .with_assignment(full(1, Weekday::Mon, "09:00", "10:00", "T", "R1"))
            .with_assignment(full(2, Weekday::Mon, "09:30", "10:30", "T", "R2"));
        let report = detect(&s);
        assert_eq!(report.teacher_conflicts.len(), 1);
        assert!(report.room_conflicts.is_empty());

        let pair = &report.teacher_conflicts[0];
        assert_eq!((pair.first, pair.second), (1, 2));
        assert_eq!(pair.resource_id, "T");
        assert_eq!(pair.overlap, TimeSlot::parse(Weekday::Mon, "09:30", "10:00").unwrap());
    }

    #[test]
    fn test_pair_counts_in_both_categories() {
        let s = Schedule::new("S1", "both")
            .with_assignment(full(1, Weekday::Tue, "09:00", "10:00", "T", "R"))
            .with_assignment(full(2, Weekday::Tue, "09:00", "10:00", "T", "R"));
        let report = detect(&s);
        assert_eq!(report.teacher_conflicts.len(), 1);
        assert_eq!(report.room_conflicts.len(), 1);
        assert_eq!(report.conflict_count(), 2);
    }

    #[test]
    fn test_no_self_conflict() {
        let s = Schedule::new("S1", "single")
            .with_assignment(full(1, Weekday::Mon, "09:00", "10:00", "T", "R"));
        let report = detect(&s);
        assert!(!report.has_conflicts());
        assert!(report.is_clean());
    }

    #[test]
    fn test_missing_reference_is_not_a_conflict() {
        let s = Schedule::new("S1", "partial")
            .with_assignment(at(1, Weekday::Mon, "09:00", "10:00").with_room("R"))
            .with_assignment(at(2, Weekday::Mon, "09:00", "10:00").with_teacher("T").with_room("R"));
        let report = detect(&s);
        assert!(report.teacher_conflicts.is_empty());
        assert_eq!(report.room_conflicts.len(), 1);
    }

    #[test]
    fn test_listing_order_is_by_assignment_id() {
        let s = Schedule::new("S1", "order")
            .with_assignment(full(30, Weekday::Mon, "09:00", "10:00", "T", "R3"))
            .with_assignment(full(10, Weekday::Mon, "09:15", "09:45", "T", "R1"))
            .with_assignment(full(20, Weekday::Mon, "09:30", "11:00", "T", "R2"));
        let report = detect(&s);
        let pairs: Vec<_> = report
            .teacher_conflicts
            .iter()
            .map(|p| (p.first, p.second))
            .collect();
        assert_eq!(pairs, vec![(10, 20), (10, 30), (20, 30)]);
    }

    #[test]
    fn test_detect_is_idempotent() {
        let s = Schedule::new("S1", "idem")
            .with_assignment(full(2, Weekday::Wed, "09:00", "10:00", "T1", "R"))
            .with_assignment(full(1, Weekday::Wed, "09:30", "10:30", "T1", "R"))
            .with_assignment(at(3, Weekday::Wed, "09:30", "10:30"));
        let at_time = Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap();
        let detector = ConflictDetector::new();
        assert_eq!(detector.detect_at(&s, at_time), detector.detect_at(&s, at_time));

        let first = detector.detect(&s);
        let second = detector.detect(&s);
        assert_eq!(first.teacher_conflicts, second.teacher_conflicts);
        assert_eq!(first.room_conflicts, second.room_conflicts);
        assert_eq!(first.defects, second.defects);
    }

    #[test]
    fn test_unassigned_and_empty_counts() {
        let s = Schedule::new("S1", "counts")
            .with_assignment(at(1, Weekday::Mon, "09:00", "10:00").with_course("MATH"))
            .with_assignment(at(2, Weekday::Mon, "10:00", "11:00"))
            .with_assignment(full(3, Weekday::Mon, "11:00", "12:00", "T", "R"));
        let report = detect(&s);
        assert_eq!(report.total_assignments, 3);
        assert_eq!(report.unassigned_count, 2);
        assert_eq!(report.empty_count, 1);
    }

    #[test]
    fn test_malformed_assignment_is_reported_and_skipped() {
        let s = Schedule::new("S1", "malformed")
            .with_assignment(full(1, Weekday::Mon, "10:00", "09:00", "T", "R"))
            .with_assignment(full(2, Weekday::Mon, "09:00", "10:00", "T", "R"))
            .with_assignment(full(3, Weekday::Mon, "09:30", "10:30", "T", "R9"));
        let report = detect(&s);

        assert_eq!(report.defects.len(), 1);
        assert_eq!(report.defects[0].kind, ValidationErrorKind::InvalidInterval);
        assert_eq!(report.defects[0].assignment_id, Some(1));

        // Remaining pairs are still checked.
        assert_eq!(report.teacher_conflicts.len(), 1);
        assert!(!report.teacher_conflicts[0].involves(1));
    }

    #[test]
    fn test_duplicate_ids_are_not_paired() {
        let s = Schedule::new("S1", "duplicates")
            .with_assignment(full(7, Weekday::Mon, "09:00", "10:00", "T1", "R1"))
            .with_assignment(full(7, Weekday::Mon, "09:30", "10:30", "T1", "R2"))
            .with_assignment(full(8, Weekday::Mon, "09:45", "10:15", "T1", "R3"));
        let report = detect(&s);

        assert!(report
            .defects
            .iter()
            .any(|d| d.kind == ValidationErrorKind::DuplicateId));
        let pairs: Vec<_> = report
            .teacher_conflicts
            .iter()
            .map(|p| (p.first, p.second))
            .collect();
        assert_eq!(pairs, vec![(7, 8), (7, 8)]);
        assert!(report.teacher_conflicts.iter().all(|p| p.first < p.second));
        assert!(report.room_conflicts.is_empty());
    }

    #[test]
    fn test_empty_schedule_is_a_defect_not_a_panic() {
        let report = detect(&Schedule::new("S0", "nothing"));
        assert_eq!(report.total_assignments, 0);
        assert_eq!(report.defects[0].kind, ValidationErrorKind::EmptySchedule);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_conflicting_assignment_ids() {
        let s = Schedule::new("S1", "ids")
            .with_assignment(full(1, Weekday::Mon, "09:00", "10:00", "T", "R1"))
            .with_assignment(full(2, Weekday::Mon, "09:30", "10:30", "T", "R2"))
            .with_assignment(full(3, Weekday::Mon, "09:45", "10:15", "T", "R3"));
        let report = detect(&s);
        let ids: Vec<_> = report
            .conflicting_assignment_ids(ResourceKind::Teacher)
            .into_iter()
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(report.conflicting_assignment_ids(ResourceKind::Room).is_empty());
    }

    #[test]
    fn test_report_serializes() {
        let s = Schedule::new("S1", "json")
            .with_assignment(full(1, Weekday::Mon, "09:00", "10:00", "T", "R"))
            .with_assignment(full(2, Weekday::Mon, "09:30", "10:30", "T", "R"));
        let report = detect(&s);
        let json = serde_json::to_string(&report).unwrap();
        let back: ConflictReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
