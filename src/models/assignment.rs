//! Assignment (schedule slot) model.
//!
//! An assignment books a teacher, a room and a course into one weekly
//! time slot. Any of the three references may be missing.
//!
//! # Classification
//! - **unassigned**: at least one of teacher/room/course is missing
//! - **empty**: all three are missing (an empty assignment is also unassigned)

use serde::{Deserialize, Serialize};

use super::TimeSlot;

/// Assignment identifier. Listing order in reports is ascending id.
pub type AssignmentId = u64;

/// Resource categories that can be double-booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A teacher can only be in one place at a time.
    Teacher,
    /// A room can only host one class at a time.
    Room,
}

impl ResourceKind {
    /// All kinds that participate in double-booking checks.
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Teacher, ResourceKind::Room];

    /// Lowercase label used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Teacher => "teacher",
            ResourceKind::Room => "room",
        }
    }
}

/// Optional resource references carried by an assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRefs {
    /// Assigned teacher.
    pub teacher_id: Option<String>,
    /// Assigned room.
    pub room_id: Option<String>,
    /// Course taught in this slot.
    pub course_id: Option<String>,
}

impl ResourceRefs {
    /// No references at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Reference for a double-bookable resource kind.
    pub fn get(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::Teacher => self.teacher_id.as_deref(),
            ResourceKind::Room => self.room_id.as_deref(),
        }
    }

    /// Whether teacher, room and course are all present.
    pub fn is_complete(&self) -> bool {
        self.teacher_id.is_some() && self.room_id.is_some() && self.course_id.is_some()
    }

    /// Whether none of teacher, room and course is present.
    pub fn is_empty(&self) -> bool {
        self.teacher_id.is_none() && self.room_id.is_none() && self.course_id.is_none()
    }
}

/// A single resource booking in a weekly time slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique identifier within a schedule.
    pub id: AssignmentId,
    /// When the booking takes place.
    pub slot: TimeSlot,
    /// What is booked.
    pub resources: ResourceRefs,
}

impl Assignment {
    /// Creates an assignment with no resource references.
    pub fn new(id: AssignmentId, slot: TimeSlot) -> Self {
        Self {
            id,
            slot,
            resources: ResourceRefs::none(),
        }
    }

    /// Sets the teacher.
    pub fn with_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.resources.teacher_id = Some(teacher_id.into());
        self
    }

    /// Sets the room.
    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.resources.room_id = Some(room_id.into());
        self
    }

    /// Sets the course.
    pub fn with_course(mut self, course_id: impl Into<String>) -> Self {
        self.resources.course_id = Some(course_id.into());
        self
    }

    /// Reference for a double-bookable resource kind.
    #[inline]
    pub fn resource(&self, kind: ResourceKind) -> Option<&str> {
        self.resources.get(kind)
    }

    /// Whether `start < end`.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.slot.is_well_formed()
    }

    /// Missing at least one of teacher/room/course.
    #[inline]
    pub fn is_unassigned(&self) -> bool {
        !self.resources.is_complete()
    }

    /// Missing all of teacher/room/course.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Whether this assignment's time overlaps another's.
    #[inline]
    pub fn overlaps(&self, other: &Assignment) -> bool {
        self.slot.overlaps(&other.slot)
    }

    /// Whether both assignments book the same resource of `kind` at
    /// overlapping times. Missing references never collide.
    pub fn collides_on(&self, other: &Assignment, kind: ResourceKind) -> bool {
        match (self.resource(kind), other.resource(kind)) {
            (Some(a), Some(b)) => a == b && self.overlaps(other),
            _ => false,
        }
    }
}

/// Overlap predicate over two assignments.
///
/// Same weekday and `a.start < b.end && b.start < a.end`. Resource
/// references are not consulted; see [`Assignment::collides_on`].
pub fn overlaps(a: &Assignment, b: &Assignment) -> bool {
    a.overlaps(b)
}
