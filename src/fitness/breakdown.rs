//! Per-category schedule fitness.
//!
//! Scores a schedule along each weighted category of an
//! [`OptimizationConfig`], independently of any optimization run.
//!
//! # Metrics
//!
//! | Category | Score | Violations |
//! |----------|-------|------------|
//! | TeacherConflicts | 1 - involved / teacher-bearing slots | teacher conflict pairs |
//! | RoomConflicts | 1 - involved / room-bearing slots | room conflict pairs |
//! | Completeness | complete slots / all slots | unassigned slots |
//! | TeacherLoadBalance | min load / max load | teachers under half the max load |
//! | RoomUtilization | mean(booked / (school day × days in use)) | rooms under half occupancy |
//!
//! Aggregates (`hard_score`, `soft_score`, `total`) are weighted means of
//! the category scores, so they stay within `[0, 1]`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ConstraintKind, FitnessCategory};
use crate::conflict::{ConflictDetector, ConflictReport};
use crate::models::{ResourceKind, Schedule};
use crate::optimize::{OptimizationConfig, SchoolDay};

/// Weighted per-category evaluation of one schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessBreakdown {
    /// Score per evaluated category, each in `[0, 1]`.
    pub scores: BTreeMap<FitnessCategory, f64>,
    /// Weight applied to each evaluated category.
    pub weights: BTreeMap<FitnessCategory, f64>,
    /// Number of violations counted per evaluated category.
    pub violation_counts: BTreeMap<FitnessCategory, usize>,
    /// Weighted mean of the hard categories.
    pub hard_score: f64,
    /// Weighted mean of the soft categories.
    pub soft_score: f64,
    /// Weighted mean of all evaluated categories.
    pub total: f64,
}

impl FitnessBreakdown {
    /// Score of one category, if it was evaluated.
    pub fn score(&self, category: FitnessCategory) -> Option<f64> {
        self.scores.get(&category).copied()
    }

    /// Total violations across all evaluated categories.
    pub fn total_violations(&self) -> usize {
        self.violation_counts.values().sum()
    }
}

/// Evaluates schedules against a fixed set of weights.
///
/// Built once per run and reused for every candidate schedule.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    weights: BTreeMap<FitnessCategory, f64>,
    school_day: SchoolDay,
    detector: ConflictDetector,
}

impl FitnessEvaluator {
    /// Takes weights and the school day from a configuration.
    ///
    /// Weights that are negative or not finite are skipped, so their
    /// categories are not evaluated.
    pub fn new(config: &OptimizationConfig) -> Self {
        let weights = config
            .category_weights
            .iter()
            .filter(|&(&category, &weight)| {
                let usable = weight.is_finite() && weight >= 0.0;
                if !usable {
                    log::warn!("ignoring weight {} for {}", weight, category);
                }
                usable
            })
            .map(|(&category, &weight)| (category, weight))
            .collect();
        Self {
            weights,
            school_day: config.school_day,
            detector: ConflictDetector::new(),
        }
    }

    /// Full breakdown of a schedule.
    pub fn evaluate(&self, schedule: &Schedule) -> FitnessBreakdown {
        let report = self.detector.detect(schedule);
        self.evaluate_with_report(schedule, &report)
    }

    /// Full breakdown reusing an existing conflict report for `schedule`.
    pub fn evaluate_with_report(
        &self,
        schedule: &Schedule,
        report: &ConflictReport,
    ) -> FitnessBreakdown {
        let mut scores = BTreeMap::new();
        let mut violation_counts = BTreeMap::new();

        for &category in self.weights.keys() {
            let (score, violations) = self.category_score(category, schedule, report);
            scores.insert(category, score.clamp(0.0, 1.0));
            violation_counts.insert(category, violations);
        }

        let hard_score = self.weighted_mean(&scores, |c| c.kind() == ConstraintKind::Hard);
        let soft_score = self.weighted_mean(&scores, |c| c.kind() == ConstraintKind::Soft);
        let total = self.weighted_mean(&scores, |_| true);

        FitnessBreakdown {
            scores,
            weights: self.weights.clone(),
            violation_counts,
            hard_score,
            soft_score,
            total,
        }
    }

    /// Weighted total only.
    pub fn score(&self, schedule: &Schedule) -> f64 {
        self.evaluate(schedule).total
    }

    fn category_score(
        &self,
        category: FitnessCategory,
        schedule: &Schedule,
        report: &ConflictReport,
    ) -> (f64, usize) {
        match category {
            FitnessCategory::TeacherConflicts => {
                conflict_score(schedule, report, ResourceKind::Teacher)
            }
            FitnessCategory::RoomConflicts => conflict_score(schedule, report, ResourceKind::Room),
            FitnessCategory::Completeness => {
                if report.total_assignments == 0 {
                    (0.0, 0)
                } else {
                    let complete = report.total_assignments - report.unassigned_count;
                    (
                        complete as f64 / report.total_assignments as f64,
                        report.unassigned_count,
                    )
                }
            }
            FitnessCategory::TeacherLoadBalance => load_balance_score(schedule),
            FitnessCategory::RoomUtilization => self.room_utilization_score(schedule),
        }
    }

    fn room_utilization_score(&self, schedule: &Schedule) -> (f64, usize) {
        let busy = schedule.booked_minutes(ResourceKind::Room);
        let available = self.school_day.minutes() * schedule.days_in_use() as i64;
        if busy.is_empty() || available <= 0 {
            return (0.0, 0);
        }

        let utilizations: Vec<f64> = busy
            .values()
            .map(|&minutes| (minutes as f64 / available as f64).min(1.0))
            .collect();
        let underused = utilizations.iter().filter(|&&u| u < 0.5).count();
        let mean = utilizations.iter().sum::<f64>() / utilizations.len() as f64;
        (mean, underused)
    }

    fn weighted_mean<F>(&self, scores: &BTreeMap<FitnessCategory, f64>, include: F) -> f64
    where
        F: Fn(FitnessCategory) -> bool,
    {
        let mut weighted = 0.0;
        let mut weight_sum = 0.0;
        for (&category, &score) in scores {
            if !include(category) {
                continue;
            }
            let weight = self.weights.get(&category).copied().unwrap_or(0.0);
            weighted += weight * score;
            weight_sum += weight;
        }
        if weight_sum > 0.0 {
            weighted / weight_sum
        } else {
            0.0
        }
    }
}

fn conflict_score(schedule: &Schedule, report: &ConflictReport, kind: ResourceKind) -> (f64, usize) {
    let bearing = schedule
        .assignments
        .iter()
        .filter(|a| a.is_well_formed() && a.resource(kind).is_some())
        .count();
    let pairs = report.conflicts(kind).len();
    if bearing == 0 {
        return (1.0, pairs);
    }
    let involved = report.conflicting_assignment_ids(kind).len();
    (1.0 - involved as f64 / bearing as f64, pairs)
}

fn load_balance_score(schedule: &Schedule) -> (f64, usize) {
    let loads = schedule.booked_minutes(ResourceKind::Teacher);
    let max = loads.values().copied().max().unwrap_or(0);
    if loads.len() < 2 || max <= 0 {
        return (1.0, 0);
    }
    let min = loads.values().copied().min().unwrap_or(0);
    let light = loads.values().filter(|&&m| (m as f64) < max as f64 / 2.0).count();
    (min as f64 / max as f64, light)
}

/// Breakdown of a schedule under a configuration's weights.
///
/// Callable before, during (on a snapshot) or after optimization, or for
/// schedules that were never optimized at all.
pub fn breakdown(schedule: &Schedule, config: &OptimizationConfig) -> FitnessBreakdown {
    FitnessEvaluator::new(config).evaluate(schedule)
}
