//! Timetable domain models.
//!
//! Provides the data types the analysis modules operate on. All of them
//! are plain values: loaded by the caller, never fetched lazily.
//!
//! # Domain Mappings
//!
//! | u-timetable | School | Campus events |
//! |-------------|--------|---------------|
//! | Assignment | Class period | Booking |
//! | TimeSlot | Weekday + bell times | Recurring slot |
//! | ResourceKind::Teacher | Teacher | Presenter |
//! | ResourceKind::Room | Classroom | Venue |
//! | Schedule | Master schedule | Event calendar |

mod assignment;
mod schedule;
mod slot;

pub use assignment::{overlaps, Assignment, AssignmentId, ResourceKind, ResourceRefs};
pub use schedule::{Schedule, ScheduleStatus};
pub use slot::TimeSlot;
