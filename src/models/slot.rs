//! Weekly time slot model.
//!
//! A slot is a half-open interval `[start, end)` on one day of the week.
//! Touching slots (one ends exactly when the next starts) do not overlap,
//! so back-to-back periods never count as a double booking.

use chrono::{NaiveTime, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

/// A time interval `[start, end)` on a single weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Day of the week.
    pub day: Weekday,
    /// Interval start (inclusive).
    pub start: NaiveTime,
    /// Interval end (exclusive).
    pub end: NaiveTime,
}

impl TimeSlot {
    /// Creates a new slot. No ordering check is made here; see
    /// [`TimeSlot::is_well_formed`].
    pub fn new(day: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self { day, start, end }
    }

    /// Parses a slot from `HH:MM` strings.
    pub fn parse(day: Weekday, start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            day,
            start: NaiveTime::parse_from_str(start, "%H:%M")?,
            end: NaiveTime::parse_from_str(end, "%H:%M")?,
        })
    }

    /// Whether `start < end`.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    /// Length of the slot. Negative or zero for malformed slots.
    #[inline]
    pub fn duration(&self) -> TimeDelta {
        self.end.signed_duration_since(self.start)
    }

    /// Length of the slot in whole minutes.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Whether two slots overlap: same weekday and
    /// `a.start < b.end && b.start < a.end`.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.day == other.day && self.start < other.end && other.start < self.end
    }

    /// The shared part of two overlapping slots.
    pub fn intersection(&self, other: &Self) -> Option<TimeSlot> {
        if !self.overlaps(other) {
            return None;
        }
        Some(TimeSlot {
            day: self.day,
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.day,
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}
