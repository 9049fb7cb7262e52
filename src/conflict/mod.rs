//! Schedule conflict detection.
//!
//! Reports teacher and room double-bookings, unassigned and empty slots,
//! and structural defects. Detection never fails on bad data: problems
//! with individual assignments show up in [`ConflictReport::defects`].
//!
//! # Usage
//!
//! ```
//! use u_timetable::conflict::detect;
//! use u_timetable::models::Schedule;
//!
//! let report = detect(&Schedule::new("S1", "Fall"));
//! assert!(!report.defects.is_empty()); // empty schedule
//! ```

mod detector;
mod report;

pub use detector::{detect, ConflictDetector};
pub use report::{ConflictPair, ConflictReport};
pub use crate::models::ResourceKind;
