//! Persistence of committed allocations.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::AllocationError;

/// Sink for approvals and waitlist entries written by a commit.
pub trait EnrollmentStore: Send + Sync {
    /// Records an approved enrollment.
    fn enroll(&self, student_id: &str, course_id: &str) -> Result<(), AllocationError>;

    /// Records a waitlist entry at a 1-based position.
    fn waitlist(
        &self,
        student_id: &str,
        course_id: &str,
        position: usize,
    ) -> Result<(), AllocationError>;
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryEnrollmentStore {
    enrollments: RwLock<BTreeSet<(String, String)>>,
    waitlists: RwLock<BTreeMap<String, BTreeMap<usize, String>>>,
}

impl InMemoryEnrollmentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a student is enrolled in a course.
    pub fn is_enrolled(&self, student_id: &str, course_id: &str) -> bool {
        self.enrollments
            .read()
            .contains(&(student_id.to_string(), course_id.to_string()))
    }

    /// All enrollments as `(student_id, course_id)`, sorted.
    pub fn enrollments(&self) -> Vec<(String, String)> {
        self.enrollments.read().iter().cloned().collect()
    }

    /// Waitlisted students of a course, in position order.
    pub fn waitlist_for(&self, course_id: &str) -> Vec<String> {
        self.waitlists
            .read()
            .get(course_id)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.enrollments.read().is_empty() && self.waitlists.read().is_empty()
    }
}

impl EnrollmentStore for InMemoryEnrollmentStore {
    fn enroll(&self, student_id: &str, course_id: &str) -> Result<(), AllocationError> {
        self.enrollments
            .write()
            .insert((student_id.to_string(), course_id.to_string()));
        Ok(())
    }

    fn waitlist(
        &self,
        student_id: &str,
        course_id: &str,
        position: usize,
    ) -> Result<(), AllocationError> {
        let mut waitlists = self.waitlists.write();
        let entries = waitlists.entry(course_id.to_string()).or_default();
        match entries.get(&position) {
            Some(existing) if existing != student_id => Err(AllocationError::Store(format!(
                "waitlist position {} of {} is already taken by {}",
                position, course_id, existing
            ))),
            _ => {
                entries.insert(position, student_id.to_string());
                Ok(())
            }
        }
    }
}
