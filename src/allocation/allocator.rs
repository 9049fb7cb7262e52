//! Priority-driven seat allocation.
//!
//! # Algorithm
//!
//! 1. Requests with a non-finite priority, for an unknown course, or
//!    repeating an earlier `(student, course)` pair are denied.
//! 2. Courses are processed in ascending id. Candidates are ordered by
//!    priority (descending), preference rank (ascending), student id.
//! 3. Seats go to the top candidates. If the candidates at the capacity
//!    boundary share a priority (within `tie_tolerance`), the whole tied
//!    group is waitlisted and flagged for review instead of being decided
//!    by the secondary keys.
//! 4. Remaining candidates fill the waitlist up to `waitlist_limit`; the
//!    rest are denied.
//! 5. Students whose approved sections overlap in time, or who exceed
//!    `max_courses_per_student`, are flagged for review.
//!
//! The plan depends only on the requests and rules, never on the store,
//! so simulating and committing the same input yield the same decisions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use super::{AllocationRules, EnrollmentRequest, EnrollmentStore};
use crate::error::AllocationError;
use crate::models::{overlaps, Assignment};

/// Outcome of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Seat granted.
    Approved,
    /// Placed on the course waitlist at a 1-based position.
    Waitlisted { position: usize },
    /// Rejected.
    Denied,
}

/// A request together with its decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationDecision {
    /// The original request.
    pub request: EnrollmentRequest,
    /// What was decided.
    pub decision: Decision,
    /// Why, when not a plain approval.
    pub reason: Option<String>,
}

/// A student the allocator could not decide for on its own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReviewItem {
    /// Student needing manual review.
    pub student_id: String,
    /// What needs reviewing.
    pub reason: String,
}

/// Unprocessed allocator output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAllocationOutcome {
    /// One decision per input request, ordered by course, then seat order.
    pub decisions: Vec<AllocationDecision>,
    /// Students flagged for review, sorted.
    pub needs_review: Vec<ReviewItem>,
    /// Problems with the input that caused denials.
    pub issues: Vec<String>,
    /// Non-critical observations.
    pub warnings: Vec<String>,
}

/// Opaque seat allocation capability.
pub trait Allocator: Send + Sync {
    /// Decides all requests. With `commit` set, approvals and waitlist
    /// entries are persisted.
    fn allocate(
        &self,
        requests: &[EnrollmentRequest],
        rules: &AllocationRules,
        commit: bool,
    ) -> Result<RawAllocationOutcome, AllocationError>;
}

/// Allocator granting seats in priority order.
#[derive(Debug)]
pub struct PriorityAllocator<S> {
    store: Arc<S>,
}

impl<S: EnrollmentStore> PriorityAllocator<S> {
    /// Creates an allocator writing commits to `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Computes decisions without touching the store.
    pub fn plan(&self, requests: &[EnrollmentRequest], rules: &AllocationRules) -> RawAllocationOutcome {
        let mut outcome = RawAllocationOutcome::default();
        let mut review = BTreeSet::new();
        let mut seen = HashSet::new();
        let mut by_course: BTreeMap<&str, Vec<&EnrollmentRequest>> = BTreeMap::new();
        let mut rejected = Vec::new();

        for request in requests {
            let key = (request.student_id.as_str(), request.course_id.as_str());
            if !seen.insert(key) {
                outcome.warnings.push(format!(
                    "Duplicate request from {} for {} ignored",
                    request.student_id, request.course_id
                ));
                rejected.push(denied(request, "duplicate request"));
            } else if !request.priority_score.is_finite() {
                outcome.issues.push(format!(
                    "Request from {} for {} has invalid priority {}",
                    request.student_id, request.course_id, request.priority_score
                ));
                rejected.push(denied(request, "invalid priority"));
            } else if !rules.capacities.contains_key(&request.course_id) {
                outcome.issues.push(format!(
                    "Request from {} for unknown course {}",
                    request.student_id, request.course_id
                ));
                rejected.push(denied(request, "unknown course"));
            } else {
                by_course.entry(request.course_id.as_str()).or_default().push(request);
            }
        }

        for (course_id, mut candidates) in by_course {
            let Some(capacity) = rules.capacities.get(course_id) else {
                continue;
            };
            candidates.sort_by(|a, b| {
                b.priority_score
                    .total_cmp(&a.priority_score)
                    .then(a.preference_rank.cmp(&b.preference_rank))
                    .then(a.student_id.cmp(&b.student_id))
            });

            let seats = capacity.max;
            let tie_score = boundary_tie(&candidates, seats, rules.tie_tolerance);
            let mut approved = 0;
            let mut waitlisted = 0;

            for request in candidates {
                let tied = tie_score
                    .is_some_and(|s| (request.priority_score - s).abs() <= rules.tie_tolerance);
                let (decision, reason) = if tied {
                    waitlisted += 1;
                    review.insert(ReviewItem {
                        student_id: request.student_id.clone(),
                        reason: format!(
                            "Tied priority {} for the last seats in {}",
                            request.priority_score, course_id
                        ),
                    });
                    (
                        Decision::Waitlisted {
                            position: waitlisted,
                        },
                        Some("tied at capacity boundary".to_string()),
                    )
                } else if approved < seats && tie_score.map_or(true, |s| request.priority_score > s) {
                    approved += 1;
                    (Decision::Approved, None)
                } else if waitlisted < rules.waitlist_limit {
                    waitlisted += 1;
                    (
                        Decision::Waitlisted {
                            position: waitlisted,
                        },
                        Some("course full".to_string()),
                    )
                } else {
                    (Decision::Denied, Some("course and waitlist full".to_string()))
                };
                outcome.decisions.push(AllocationDecision {
                    request: request.clone(),
                    decision,
                    reason,
                });
            }
        }

        outcome.decisions.extend(rejected);
        review.extend(student_reviews(&outcome.decisions, rules));
        outcome.needs_review = review.into_iter().collect();
        outcome
    }

    /// Writes approvals and waitlist entries in decision order. Stops at
    /// the first store failure; earlier writes are not rolled back.
    fn persist(&self, outcome: &RawAllocationOutcome) -> Result<(), AllocationError> {
        let mut persisted = Vec::new();
        for d in &outcome.decisions {
            let written = match d.decision {
                Decision::Approved => self.store.enroll(&d.request.student_id, &d.request.course_id),
                Decision::Waitlisted { position } => {
                    self.store
                        .waitlist(&d.request.student_id, &d.request.course_id, position)
                }
                Decision::Denied => continue,
            };
            if let Err(err) = written {
                return Err(AllocationError::PartialCommit {
                    planned: Box::new(outcome.clone()),
                    persisted,
                    cause: err.to_string(),
                });
            }
            persisted.push(d.clone());
        }
        Ok(())
    }
}

impl<S: EnrollmentStore> Allocator for PriorityAllocator<S> {
    fn allocate(
        &self,
        requests: &[EnrollmentRequest],
        rules: &AllocationRules,
        commit: bool,
    ) -> Result<RawAllocationOutcome, AllocationError> {
        let outcome = self.plan(requests, rules);
        if commit {
            self.persist(&outcome)?;
        }
        Ok(outcome)
    }
}

fn denied(request: &EnrollmentRequest, reason: &str) -> AllocationDecision {
    AllocationDecision {
        request: request.clone(),
        decision: Decision::Denied,
        reason: Some(reason.to_string()),
    }
}

/// Priority shared by the last seat holder and the first candidate left
/// out, if any. `candidates` must be sorted.
fn boundary_tie(candidates: &[&EnrollmentRequest], seats: usize, tolerance: f64) -> Option<f64> {
    if seats == 0 || candidates.len() <= seats {
        return None;
    }
    let last_in = candidates[seats - 1].priority_score;
    let first_out = candidates[seats].priority_score;
    ((last_in - first_out).abs() <= tolerance).then_some(last_in)
}

/// Flags course-limit violations and time clashes between approved sections.
fn student_reviews(decisions: &[AllocationDecision], rules: &AllocationRules) -> Vec<ReviewItem> {
    let mut approved: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for d in decisions.iter().filter(|d| d.decision == Decision::Approved) {
        approved
            .entry(d.request.student_id.as_str())
            .or_default()
            .push(d.request.course_id.as_str());
    }

    let mut sections: BTreeMap<&str, Vec<&Assignment>> = BTreeMap::new();
    for section in rules.section_slots.iter().filter(|s| s.is_well_formed()) {
        if let Some(course_id) = section.resources.course_id.as_deref() {
            sections.entry(course_id).or_default().push(section);
        }
    }

    let mut items = Vec::new();
    for (student_id, mut courses) in approved {
        courses.sort_unstable();
        if let Some(max) = rules.max_courses_per_student {
            if courses.len() > max {
                items.push(ReviewItem {
                    student_id: student_id.to_string(),
                    reason: format!("Approved for {} courses, limit is {}", courses.len(), max),
                });
            }
        }
        for (i, a) in courses.iter().enumerate() {
            for b in &courses[i + 1..] {
                if let Some(slot) = first_clash(&sections, a, b) {
                    items.push(ReviewItem {
                        student_id: student_id.to_string(),
                        reason: format!("{} and {} meet at the same time ({})", a, b, slot),
                    });
                }
            }
        }
    }
    items
}

fn first_clash(
    sections: &BTreeMap<&str, Vec<&Assignment>>,
    a: &str,
    b: &str,
) -> Option<crate::models::TimeSlot> {
    let (left, right) = (sections.get(a)?, sections.get(b)?);
    left.iter()
        .flat_map(|x| right.iter().map(move |y| (*x, *y)))
        .find(|(x, y)| overlaps(x, y))
        .and_then(|(x, y)| x.slot.intersection(&y.slot))
}
