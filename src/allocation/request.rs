//! Enrollment requests and allocation rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Assignment;

/// A student's request for a seat in a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    /// Requesting student.
    pub student_id: String,
    /// Requested course.
    pub course_id: String,
    /// Higher scores are served first.
    pub priority_score: f64,
    /// 1 = first choice. Lower ranks win among equal priorities.
    pub preference_rank: u8,
}

impl EnrollmentRequest {
    /// Creates a first-choice request.
    pub fn new(
        student_id: impl Into<String>,
        course_id: impl Into<String>,
        priority_score: f64,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            course_id: course_id.into(),
            priority_score,
            preference_rank: 1,
        }
    }

    /// Sets the preference rank.
    pub fn with_preference_rank(mut self, rank: u8) -> Self {
        self.preference_rank = rank;
        self
    }
}

/// Enrollment bounds of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCapacity {
    /// Below this the course may be cancelled.
    pub min: usize,
    /// Preferred class size.
    pub optimal: usize,
    /// Hard seat limit.
    pub max: usize,
}

impl CourseCapacity {
    /// Creates capacity bounds.
    pub fn new(min: usize, optimal: usize, max: usize) -> Self {
        Self { min, optimal, max }
    }

    /// Classifies an enrollment count.
    pub fn status(&self, enrolled: usize) -> CapacityStatus {
        if enrolled >= self.max {
            CapacityStatus::Full
        } else if enrolled >= self.optimal {
            CapacityStatus::AtOptimal
        } else if enrolled >= self.min {
            CapacityStatus::Open
        } else {
            CapacityStatus::BelowMinimum
        }
    }
}

/// Where a course's enrollment sits relative to its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapacityStatus {
    /// Fewer students than `min`.
    BelowMinimum,
    /// Between `min` and `optimal`.
    Open,
    /// At or above `optimal`, below `max`.
    AtOptimal,
    /// No seats left.
    Full,
}

/// Rules applied to one allocation pass.
///
/// `capacities` holds the seats still available per course. Requests for
/// courses missing from it are denied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationRules {
    /// Seat bounds per course id.
    pub capacities: BTreeMap<String, CourseCapacity>,
    /// Maximum waitlist length per course. Tied requests are waitlisted
    /// even beyond this limit.
    pub waitlist_limit: usize,
    /// Priority scores closer than this are considered tied.
    pub tie_tolerance: f64,
    /// Flag students approved for more courses than this.
    pub max_courses_per_student: Option<usize>,
    /// Meeting times of course sections (`course_id` must be set).
    pub section_slots: Vec<Assignment>,
}

impl Default for AllocationRules {
    fn default() -> Self {
        Self {
            capacities: BTreeMap::new(),
            waitlist_limit: 10,
            tie_tolerance: 1e-9,
            max_courses_per_student: None,
            section_slots: Vec::new(),
        }
    }
}

impl AllocationRules {
    /// Creates empty rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capacity of a course.
    pub fn with_capacity(mut self, course_id: impl Into<String>, capacity: CourseCapacity) -> Self {
        self.capacities.insert(course_id.into(), capacity);
        self
    }

    /// Sets the waitlist limit.
    pub fn with_waitlist_limit(mut self, limit: usize) -> Self {
        self.waitlist_limit = limit;
        self
    }

    /// Sets the tie tolerance.
    pub fn with_tie_tolerance(mut self, tolerance: f64) -> Self {
        self.tie_tolerance = tolerance;
        self
    }

    /// Sets the per-student course limit.
    pub fn with_max_courses_per_student(mut self, max: usize) -> Self {
        self.max_courses_per_student = Some(max);
        self
    }

    /// Adds a section meeting time.
    pub fn with_section(mut self, section: Assignment) -> Self {
        self.section_slots.push(section);
        self
    }
}
