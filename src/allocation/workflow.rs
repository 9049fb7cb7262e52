//! Simulate-then-commit assignment workflow.

use std::sync::Arc;

use super::{AllocationRules, Allocator, AssignmentResult, EnrollmentRequest, RawAllocationOutcome};
use crate::conflict::ConflictDetector;
use crate::error::AllocationError;
use crate::models::Schedule;

/// Runs an [`Allocator`] in simulation or commit mode.
///
/// Both modes share one code path; only the `commit` flag passed to the
/// allocator differs. The workflow does not require a prior simulation
/// before a commit; callers check [`AssignmentResult::is_simulation`].
#[derive(Clone)]
pub struct AssignmentWorkflow {
    allocator: Arc<dyn Allocator>,
    detector: ConflictDetector,
}

impl std::fmt::Debug for AssignmentWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentWorkflow").finish_non_exhaustive()
    }
}

impl AssignmentWorkflow {
    /// Creates a workflow around an allocator.
    pub fn new(allocator: Arc<dyn Allocator>) -> Self {
        Self {
            allocator,
            detector: ConflictDetector::new(),
        }
    }

    /// Dry run. Nothing is persisted; safe to repeat.
    pub fn simulate(&self, requests: &[EnrollmentRequest], rules: &AllocationRules) -> AssignmentResult {
        self.run(requests, rules, false)
    }

    /// Persists approvals and waitlist entries. Not rolled back on later
    /// failure.
    pub fn commit(&self, requests: &[EnrollmentRequest], rules: &AllocationRules) -> AssignmentResult {
        self.run(requests, rules, true)
    }

    fn run(&self, requests: &[EnrollmentRequest], rules: &AllocationRules, commit: bool) -> AssignmentResult {
        let mode = if commit { "commit" } else { "simulation" };
        match self.allocator.allocate(requests, rules, commit) {
            Ok(raw) => {
                let result = self.build(raw, rules, commit);
                log::info!("{} finished: {}", mode, result.summary());
                result
            }
            Err(err) => {
                log::warn!("{} failed: {}", mode, err);
                let message = err.to_string();
                match err {
                    AllocationError::PartialCommit {
                        planned, persisted, ..
                    } => self
                        .build(*planned, rules, commit)
                        .with_partial_commit(message, persisted),
                    AllocationError::Store(_) => {
                        AssignmentResult::failed(message, requests.len(), !commit)
                    }
                }
            }
        }
    }

    fn build(&self, mut raw: RawAllocationOutcome, rules: &AllocationRules, commit: bool) -> AssignmentResult {
        raw.warnings.extend(self.timetable_warnings(rules));
        AssignmentResult::from_outcome(&raw, rules, !commit)
    }

    /// Double-bookings and malformed slots in the section timetable.
    fn timetable_warnings(&self, rules: &AllocationRules) -> Vec<String> {
        if rules.section_slots.is_empty() {
            return Vec::new();
        }
        let sections = Schedule {
            id: "sections".to_string(),
            name: "Section timetable".to_string(),
            assignments: rules.section_slots.clone(),
            ..Schedule::default()
        };
        let report = self.detector.detect(&sections);
        report
            .teacher_conflicts
            .iter()
            .chain(&report.room_conflicts)
            .map(|pair| format!("Section timetable: {pair}"))
            .chain(
                report
                    .defects
                    .iter()
                    .map(|defect| format!("Section timetable: {defect}")),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{
        CourseCapacity, Decision, EnrollmentStore, InMemoryEnrollmentStore, PriorityAllocator,
    };
    use crate::models::{Assignment, TimeSlot};
    use chrono::Weekday;

    fn setup() -> (AssignmentWorkflow, Arc<InMemoryEnrollmentStore>) {
        let store = Arc::new(InMemoryEnrollmentStore::new());
        let allocator = PriorityAllocator::new(Arc::clone(&store));
        (AssignmentWorkflow::new(Arc::new(allocator)), store)
    }

    fn rules() -> AllocationRules {
        AllocationRules::new()
            .with_capacity("MATH", CourseCapacity::new(1, 2, 2))
            .with_capacity("PHYS", CourseCapacity::new(1, 2, 3))
            .with_section(
                Assignment::new(1, TimeSlot::parse(Weekday::Mon, "09:00", "10:00").unwrap())
                    .with_teacher("T1")
                    .with_room("R1")
                    .with_course("MATH"),
            )
            .with_section(
                Assignment::new(2, TimeSlot::parse(Weekday::Tue, "09:00", "10:00").unwrap())
                    .with_teacher("T2")
                    .with_room("R2")
                    .with_course("PHYS"),
            )
    }

    fn requests() -> Vec<EnrollmentRequest> {
        vec![
            EnrollmentRequest::new("s1", "MATH", 95.0),
            EnrollmentRequest::new("s2", "MATH", 80.0),
            EnrollmentRequest::new("s3", "MATH", 80.0),
            EnrollmentRequest::new("s1", "PHYS", 60.0).with_preference_rank(2),
            EnrollmentRequest::new("s4", "PHYS", 70.0),
        ]
    }

    #[test]
    fn test_simulate_and_commit_agree() {
        let (workflow, _store) = setup();
        let simulated = workflow.simulate(&requests(), &rules());
        let committed = workflow.commit(&requests(), &rules());

        assert!(simulated.is_simulation);
        assert!(!committed.is_simulation);
        let relabelled = AssignmentResult {
            is_simulation: false,
            ..simulated
        };
        assert_eq!(relabelled, committed);
    }

    #[test]
    fn test_simulate_persists_nothing() {
        let (workflow, store) = setup();
        workflow.simulate(&requests(), &rules());
        workflow.simulate(&requests(), &rules());
        assert!(store.is_empty());

        workflow.commit(&requests(), &rules());
        assert!(store.is_enrolled("s1", "MATH"));
        assert!(store.is_enrolled("s4", "PHYS"));
        assert_eq!(store.waitlist_for("MATH"), vec!["s2", "s3"]);
    }

    #[test]
    fn test_ties_surface_for_review() {
        let (workflow, _store) = setup();
        let result = workflow.simulate(&requests(), &rules());

        assert_eq!(result.students_needing_review, vec!["s2", "s3"]);
        assert_eq!(result.requests_approved, 3);
        assert_eq!(result.requests_waitlisted, 2);
        assert_eq!(result.requests_denied, 0);
        assert!((result.success_rate - 60.0).abs() < 1e-10);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_section_double_booking_is_warned() {
        let (workflow, _store) = setup();
        let rules = rules().with_section(
            Assignment::new(3, TimeSlot::parse(Weekday::Mon, "09:30", "10:30").unwrap())
                .with_teacher("T1")
                .with_room("R3")
                .with_course("PHYS"),
        );
        let result = workflow.simulate(&requests(), &rules);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("T1"));
    }

    struct BrokenAllocator;

    impl Allocator for BrokenAllocator {
        fn allocate(
            &self,
            _requests: &[EnrollmentRequest],
            _rules: &AllocationRules,
            _commit: bool,
        ) -> Result<RawAllocationOutcome, AllocationError> {
            Err(AllocationError::Store("connection refused".into()))
        }
    }

    #[test]
    fn test_allocator_error_becomes_failed_result() {
        let workflow = AssignmentWorkflow::new(Arc::new(BrokenAllocator));
        let simulated = workflow.simulate(&requests(), &rules());
        let committed = workflow.commit(&requests(), &rules());

        assert!(simulated.failure.as_deref().unwrap().contains("connection refused"));
        assert!(!committed.is_successful());
        assert_eq!(
            AssignmentResult {
                is_simulation: false,
                ..simulated
            },
            committed
        );
    }

    #[test]
    fn test_commit_failing_midway_reports_persisted_writes() {
        let (workflow, store) = setup();
        store.waitlist("s9", "MATH", 1).unwrap();
        let rules = AllocationRules::new().with_capacity("MATH", CourseCapacity::new(1, 1, 1));
        let requests = vec![
            EnrollmentRequest::new("s1", "MATH", 95.0),
            EnrollmentRequest::new("s2", "MATH", 80.0),
        ];

        let result = workflow.commit(&requests, &rules);

        assert!(!result.is_successful());
        assert!(result
            .failure
            .as_deref()
            .unwrap()
            .contains("already taken by s9"));
        assert_eq!(result.requests_approved, 1);
        assert_eq!(result.requests_waitlisted, 1);
        assert_eq!(result.persisted_before_failure.len(), 1);
        assert_eq!(result.persisted_before_failure[0].request.student_id, "s1");
        assert_eq!(result.persisted_before_failure[0].decision, Decision::Approved);
        assert!(store.is_enrolled("s1", "MATH"));
        assert_eq!(store.waitlist_for("MATH"), vec!["s9"]);
    }
}
