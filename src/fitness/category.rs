//! Fitness categories.

use serde::{Deserialize, Serialize};

/// Whether a category must be satisfied or is merely preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Must be satisfied for a usable timetable.
    Hard,
    /// Preferred, traded off against other soft categories.
    Soft,
}

impl ConstraintKind {
    /// Default weight multiplier for categories of this kind.
    pub fn base_weight(&self) -> f64 {
        match self {
            ConstraintKind::Hard => 1000.0,
            ConstraintKind::Soft => 100.0,
        }
    }
}

/// A quality dimension along which a schedule is scored.
///
/// Every score lies in `[0, 1]`; higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessCategory {
    /// Share of teacher-bearing slots not involved in a teacher double-booking.
    TeacherConflicts,
    /// Share of room-bearing slots not involved in a room double-booking.
    RoomConflicts,
    /// Share of slots with teacher, room and course all assigned.
    Completeness,
    /// Ratio of the lightest to the heaviest teacher load.
    TeacherLoadBalance,
    /// Mean room occupancy over the school day on the days in use.
    RoomUtilization,
}

impl FitnessCategory {
    /// All categories, in report order.
    pub const ALL: [FitnessCategory; 5] = [
        FitnessCategory::TeacherConflicts,
        FitnessCategory::RoomConflicts,
        FitnessCategory::Completeness,
        FitnessCategory::TeacherLoadBalance,
        FitnessCategory::RoomUtilization,
    ];

    /// Hard or soft.
    pub fn kind(&self) -> ConstraintKind {
        match self {
            FitnessCategory::TeacherConflicts
            | FitnessCategory::RoomConflicts
            | FitnessCategory::Completeness => ConstraintKind::Hard,
            FitnessCategory::TeacherLoadBalance | FitnessCategory::RoomUtilization => {
                ConstraintKind::Soft
            }
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            FitnessCategory::TeacherConflicts => "No Teacher Overlap",
            FitnessCategory::RoomConflicts => "No Room Overlap",
            FitnessCategory::Completeness => "All Slots Assigned",
            FitnessCategory::TeacherLoadBalance => "Balance Teacher Load",
            FitnessCategory::RoomUtilization => "Optimize Room Usage",
        }
    }
}

impl std::fmt::Display for FitnessCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
