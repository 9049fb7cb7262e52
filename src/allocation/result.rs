//! Allocation result reporting.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use super::{
    AllocationDecision, AllocationRules, CapacityStatus, CourseCapacity, Decision,
    RawAllocationOutcome,
};

/// Success rate (percent) at or above which a run counts as successful.
pub const SUCCESS_THRESHOLD: f64 = 80.0;

/// Per-course outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAssignmentDetail {
    /// Requests received for the course.
    pub requests_received: usize,
    /// First-choice requests among them.
    pub first_choice_requests: usize,
    /// Approved requests.
    pub students_enrolled: usize,
    /// Waitlisted requests.
    pub waitlist_count: usize,
    /// Seat bounds, if the course is known.
    pub capacity: Option<CourseCapacity>,
    /// Enrollment relative to the bounds, if the course is known.
    pub status: Option<CapacityStatus>,
}

/// Per-student outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentAssignmentDetail {
    /// Approved course ids.
    pub assigned_courses: Vec<String>,
    /// Waitlisted course ids.
    pub waitlisted_courses: Vec<String>,
    /// Denied course ids.
    pub denied_courses: Vec<String>,
    /// Every request of the student was approved.
    pub has_complete_schedule: bool,
}

/// Result of one simulate or commit pass.
///
/// Holds no timestamps or other per-invocation data, so a simulation and
/// a commit of the same input compare equal apart from `is_simulation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResult {
    /// Produced by `simulate` (nothing persisted).
    pub is_simulation: bool,
    /// Requests in the input.
    pub total_requests_processed: usize,
    /// Approved requests.
    pub requests_approved: usize,
    /// Waitlisted requests.
    pub requests_waitlisted: usize,
    /// Denied requests.
    pub requests_denied: usize,
    /// Approved requests per preference rank.
    pub approved_by_preference: BTreeMap<u8, usize>,
    /// Approved / processed, in percent.
    pub success_rate: f64,
    /// First-choice approvals / approvals, in percent.
    pub first_choice_satisfaction_rate: f64,
    /// Distinct students in the input.
    pub total_students_processed: usize,
    /// Students with every request approved.
    pub students_with_complete_schedules: usize,
    /// Students flagged for manual review, sorted and unique.
    pub students_needing_review: Vec<String>,
    /// Review reasons, one line per flag.
    pub review_reasons: Vec<String>,
    /// Distinct courses in the input.
    pub total_courses_processed: usize,
    /// Courses with no seats left.
    pub courses_now_full: usize,
    /// Courses at or above their optimal size.
    pub courses_at_optimal: usize,
    /// Courses below their minimum size.
    pub courses_below_minimum: usize,
    /// Courses with at least one waitlisted request.
    pub courses_with_waitlists: usize,
    /// Per-course details.
    pub course_details: BTreeMap<String, CourseAssignmentDetail>,
    /// Per-student details.
    pub student_details: BTreeMap<String, StudentAssignmentDetail>,
    /// Critical problems.
    pub issues: Vec<String>,
    /// Non-critical observations.
    pub warnings: Vec<String>,
    /// Allocator error that aborted the pass.
    pub failure: Option<String>,
    /// Decisions written to the store before a commit failed. The counts
    /// above describe the full plan.
    pub persisted_before_failure: Vec<AllocationDecision>,
    /// Multi-line human-readable report.
    pub detailed_report: String,
}

impl AssignmentResult {
    /// Builds a result from allocator output.
    pub fn from_outcome(
        raw: &RawAllocationOutcome,
        rules: &AllocationRules,
        is_simulation: bool,
    ) -> Self {
        let mut approved_by_preference = BTreeMap::new();
        let mut course_details: BTreeMap<String, CourseAssignmentDetail> = BTreeMap::new();
        let mut student_details: BTreeMap<String, StudentAssignmentDetail> = BTreeMap::new();
        let (mut approved, mut waitlisted, mut denied) = (0, 0, 0);

        for d in &raw.decisions {
            let request = &d.request;
            let course = course_details
                .entry(request.course_id.clone())
                .or_insert_with(|| CourseAssignmentDetail {
                    requests_received: 0,
                    first_choice_requests: 0,
                    students_enrolled: 0,
                    waitlist_count: 0,
                    capacity: rules.capacities.get(&request.course_id).copied(),
                    status: None,
                });
            let student = student_details
                .entry(request.student_id.clone())
                .or_default();

            course.requests_received += 1;
            if request.preference_rank == 1 {
                course.first_choice_requests += 1;
            }
            match d.decision {
                Decision::Approved => {
                    approved += 1;
                    *approved_by_preference
                        .entry(request.preference_rank)
                        .or_insert(0) += 1;
                    course.students_enrolled += 1;
                    student.assigned_courses.push(request.course_id.clone());
                }
                Decision::Waitlisted { .. } => {
                    waitlisted += 1;
                    course.waitlist_count += 1;
                    student.waitlisted_courses.push(request.course_id.clone());
                }
                Decision::Denied => {
                    denied += 1;
                    student.denied_courses.push(request.course_id.clone());
                }
            }
        }

        for course in course_details.values_mut() {
            course.status = course.capacity.map(|c| c.status(course.students_enrolled));
        }
        for student in student_details.values_mut() {
            student.assigned_courses.sort();
            student.waitlisted_courses.sort();
            student.denied_courses.sort();
            student.has_complete_schedule = !student.assigned_courses.is_empty()
                && student.waitlisted_courses.is_empty()
                && student.denied_courses.is_empty();
        }

        let total = raw.decisions.len();
        let first_choice = approved_by_preference.get(&1).copied().unwrap_or(0);
        let count_status = |status: CapacityStatus| {
            course_details
                .values()
                .filter(|c| c.status == Some(status))
                .count()
        };
        let students_needing_review: BTreeSet<String> = raw
            .needs_review
            .iter()
            .map(|r| r.student_id.clone())
            .collect();

        let mut result = Self {
            is_simulation,
            total_requests_processed: total,
            requests_approved: approved,
            requests_waitlisted: waitlisted,
            requests_denied: denied,
            success_rate: percent(approved, total),
            first_choice_satisfaction_rate: percent(first_choice, approved),
            approved_by_preference,
            total_students_processed: student_details.len(),
            students_with_complete_schedules: student_details
                .values()
                .filter(|s| s.has_complete_schedule)
                .count(),
            students_needing_review: students_needing_review.into_iter().collect(),
            review_reasons: raw
                .needs_review
                .iter()
                .map(|r| format!("{}: {}", r.student_id, r.reason))
                .collect(),
            total_courses_processed: course_details.len(),
            courses_now_full: count_status(CapacityStatus::Full),
            courses_at_optimal: count_status(CapacityStatus::AtOptimal),
            courses_below_minimum: count_status(CapacityStatus::BelowMinimum),
            courses_with_waitlists: course_details
                .values()
                .filter(|c| c.waitlist_count > 0)
                .count(),
            course_details,
            student_details,
            issues: raw.issues.clone(),
            warnings: raw.warnings.clone(),
            failure: None,
            persisted_before_failure: Vec::new(),
            detailed_report: String::new(),
        };
        result.detailed_report = result.render_report();
        result
    }

    /// Result of a pass the allocator aborted.
    pub fn failed(message: impl Into<String>, total_requests: usize, is_simulation: bool) -> Self {
        let message = message.into();
        let mut result = Self {
            is_simulation,
            total_requests_processed: total_requests,
            requests_approved: 0,
            requests_waitlisted: 0,
            requests_denied: 0,
            approved_by_preference: BTreeMap::new(),
            success_rate: 0.0,
            first_choice_satisfaction_rate: 0.0,
            total_students_processed: 0,
            students_with_complete_schedules: 0,
            students_needing_review: Vec::new(),
            review_reasons: Vec::new(),
            total_courses_processed: 0,
            courses_now_full: 0,
            courses_at_optimal: 0,
            courses_below_minimum: 0,
            courses_with_waitlists: 0,
            course_details: BTreeMap::new(),
            student_details: BTreeMap::new(),
            issues: vec![message.clone()],
            warnings: Vec::new(),
            failure: Some(message),
            persisted_before_failure: Vec::new(),
            detailed_report: String::new(),
        };
        result.detailed_report = result.render_report();
        result
    }

    /// Marks a commit that stopped partway, keeping the planned counts
    /// and listing the decisions that did reach the store.
    pub fn with_partial_commit(
        mut self,
        message: impl Into<String>,
        persisted: Vec<AllocationDecision>,
    ) -> Self {
        let message = message.into();
        self.issues.push(message.clone());
        self.failure = Some(message);
        self.persisted_before_failure = persisted;
        self.detailed_report = self.render_report();
        self
    }

    /// Success rate at or above 80% with no issues.
    pub fn is_successful(&self) -> bool {
        self.failure.is_none() && self.success_rate >= SUCCESS_THRESHOLD && self.issues.is_empty()
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        format!(
            "Assignment {}: {}/{} requests approved ({:.1}%), {} waitlisted, {} denied. \
             Review: {}, Issues: {}, Warnings: {}",
            if self.is_successful() {
                "SUCCESSFUL"
            } else {
                "COMPLETED WITH ISSUES"
            },
            self.requests_approved,
            self.total_requests_processed,
            self.success_rate,
            self.requests_waitlisted,
            self.requests_denied,
            self.students_needing_review.len(),
            self.issues.len(),
            self.warnings.len()
        )
    }

    fn render_report(&self) -> String {
        let rule = "=".repeat(72);
        let mut out = String::new();
        let _ = writeln!(out, "{rule}\nCOURSE ASSIGNMENT REPORT\n{rule}\n");

        if let Some(failure) = &self.failure {
            let _ = writeln!(out, "Allocation failed: {failure}\n");
            if !self.persisted_before_failure.is_empty() {
                let _ = writeln!(out, "Persisted before failure:");
                for d in &self.persisted_before_failure {
                    let _ = writeln!(
                        out,
                        "  - {} -> {} ({:?})",
                        d.request.student_id, d.request.course_id, d.decision
                    );
                }
                let _ = writeln!(out);
            }
        }

        let _ = writeln!(out, "Requests:");
        let _ = writeln!(out, "  Processed: {}", self.total_requests_processed);
        let _ = writeln!(
            out,
            "  Approved: {} ({:.1}%)",
            self.requests_approved, self.success_rate
        );
        let _ = writeln!(out, "  Waitlisted: {}", self.requests_waitlisted);
        let _ = writeln!(out, "  Denied: {}\n", self.requests_denied);

        let _ = writeln!(out, "Students:");
        let _ = writeln!(out, "  Total: {}", self.total_students_processed);
        let _ = writeln!(
            out,
            "  Complete schedules: {}",
            self.students_with_complete_schedules
        );
        let _ = writeln!(out, "  Need review: {}\n", self.students_needing_review.len());

        let _ = writeln!(out, "Preference satisfaction:");
        let _ = writeln!(
            out,
            "  1st choice rate: {:.1}%",
            self.first_choice_satisfaction_rate
        );
        for (rank, count) in &self.approved_by_preference {
            let _ = writeln!(out, "  Choice {rank}: {count}");
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Courses:");
        let _ = writeln!(out, "  Total: {}", self.total_courses_processed);
        let _ = writeln!(out, "  Full: {}", self.courses_now_full);
        let _ = writeln!(out, "  At optimal: {}", self.courses_at_optimal);
        let _ = writeln!(out, "  Below minimum: {}", self.courses_below_minimum);
        let _ = writeln!(out, "  With waitlists: {}\n", self.courses_with_waitlists);

        for (title, lines) in [
            ("Critical issues", &self.issues),
            ("Warnings", &self.warnings),
            ("Students needing manual review", &self.review_reasons),
        ] {
            if lines.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{title}:");
            for line in lines {
                let _ = writeln!(out, "  - {line}");
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "{rule}");
        out
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{AllocationDecision, EnrollmentRequest, ReviewItem};

    fn decision(student: &str, course: &str, rank: u8, decision: Decision) -> AllocationDecision {
        AllocationDecision {
            request: EnrollmentRequest::new(student, course, 1.0).with_preference_rank(rank),
            decision,
            reason: None,
        }
    }

    fn rules() -> AllocationRules {
        AllocationRules::new()
            .with_capacity("MATH", CourseCapacity::new(1, 2, 2))
            .with_capacity("ART", CourseCapacity::new(3, 5, 8))
    }

    #[test]
    fn test_counts_and_rates() {
        let raw = RawAllocationOutcome {
            decisions: vec![
                decision("s1", "MATH", 1, Decision::Approved),
                decision("s2", "MATH", 2, Decision::Approved),
                decision("s3", "MATH", 1, Decision::Waitlisted { position: 1 }),
                decision("s1", "ART", 1, Decision::Approved),
                decision("s3", "ART", 3, Decision::Denied),
            ],
            ..RawAllocationOutcome::default()
        };
        let result = AssignmentResult::from_outcome(&raw, &rules(), true);

        assert!(result.is_simulation);
        assert_eq!(result.total_requests_processed, 5);
        assert_eq!(result.requests_approved, 3);
        assert_eq!(result.requests_waitlisted, 1);
        assert_eq!(result.requests_denied, 1);
        assert!((result.success_rate - 60.0).abs() < 1e-10);
        assert!((result.first_choice_satisfaction_rate - 200.0 / 3.0).abs() < 1e-10);
        assert_eq!(result.approved_by_preference.get(&1), Some(&2));
        assert_eq!(result.total_students_processed, 3);
        assert_eq!(result.students_with_complete_schedules, 2);
        assert_eq!(result.total_courses_processed, 2);
        assert_eq!(result.courses_now_full, 1);
        assert_eq!(result.courses_below_minimum, 1);
        assert_eq!(result.courses_with_waitlists, 1);
        assert_eq!(result.course_details["MATH"].status, Some(CapacityStatus::Full));
        assert_eq!(result.student_details["s1"].assigned_courses, vec!["ART", "MATH"]);
        assert!(!result.is_successful());
    }

    #[test]
    fn test_success_threshold() {
        let raw = RawAllocationOutcome {
            decisions: vec![
                decision("s1", "ART", 1, Decision::Approved),
                decision("s2", "ART", 1, Decision::Approved),
                decision("s3", "ART", 1, Decision::Approved),
                decision("s4", "ART", 1, Decision::Approved),
                decision("s5", "ART", 1, Decision::Waitlisted { position: 1 }),
            ],
            ..RawAllocationOutcome::default()
        };
        let result = AssignmentResult::from_outcome(&raw, &rules(), false);
        assert!(result.is_successful());
        assert!(result.summary().starts_with("Assignment SUCCESSFUL: 4/5"));

        let with_issue = RawAllocationOutcome {
            issues: vec!["unknown course".into()],
            ..raw
        };
        assert!(!AssignmentResult::from_outcome(&with_issue, &rules(), false).is_successful());
    }

    #[test]
    fn test_review_students_unique_and_sorted() {
        let raw = RawAllocationOutcome {
            decisions: vec![decision("s2", "MATH", 1, Decision::Approved)],
            needs_review: vec![
                ReviewItem {
                    student_id: "s2".into(),
                    reason: "a".into(),
                },
                ReviewItem {
                    student_id: "s1".into(),
                    reason: "b".into(),
                },
                ReviewItem {
                    student_id: "s2".into(),
                    reason: "c".into(),
                },
            ],
            ..RawAllocationOutcome::default()
        };
        let result = AssignmentResult::from_outcome(&raw, &rules(), true);
        assert_eq!(result.students_needing_review, vec!["s1", "s2"]);
        assert_eq!(result.review_reasons.len(), 3);
        assert!(result.detailed_report.contains("Students needing manual review"));
    }

    #[test]
    fn test_empty_input() {
        let result =
            AssignmentResult::from_outcome(&RawAllocationOutcome::default(), &rules(), true);
        assert_eq!(result.success_rate, 0.0);
        assert_eq!(result.total_courses_processed, 0);
        assert!(!result.is_successful());
    }

    #[test]
    fn test_failed_result() {
        let result = AssignmentResult::failed("store offline", 4, false);
        assert_eq!(result.failure.as_deref(), Some("store offline"));
        assert_eq!(result.total_requests_processed, 4);
        assert!(!result.is_successful());
        assert!(result.detailed_report.contains("Allocation failed: store offline"));
    }

    #[test]
    fn test_partial_commit_keeps_plan_and_lists_writes() {
        let raw = RawAllocationOutcome {
            decisions: vec![
                decision("s1", "MATH", 1, Decision::Approved),
                decision("s2", "MATH", 1, Decision::Waitlisted { position: 1 }),
            ],
            ..RawAllocationOutcome::default()
        };
        let persisted = vec![raw.decisions[0].clone()];
        let result = AssignmentResult::from_outcome(&raw, &rules(), false)
            .with_partial_commit("position taken", persisted.clone());

        assert_eq!(result.requests_approved, 1);
        assert_eq!(result.requests_waitlisted, 1);
        assert_eq!(result.failure.as_deref(), Some("position taken"));
        assert_eq!(result.issues, vec!["position taken"]);
        assert_eq!(result.persisted_before_failure, persisted);
        assert!(!result.is_successful());
        assert!(result.detailed_report.contains("Persisted before failure:"));
        assert!(result.detailed_report.contains("s1 -> MATH (Approved)"));
    }

    #[test]
    fn test_report_has_no_mode_line() {
        let raw = RawAllocationOutcome {
            decisions: vec![decision("s1", "MATH", 1, Decision::Approved)],
            ..RawAllocationOutcome::default()
        };
        let simulated = AssignmentResult::from_outcome(&raw, &rules(), true);
        let committed = AssignmentResult::from_outcome(&raw, &rules(), false);
        assert_eq!(simulated.detailed_report, committed.detailed_report);
    }
}
