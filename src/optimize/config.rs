//! Optimization run configuration.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::error::ConfigurationError;
use crate::fitness::FitnessCategory;

/// Search strategy a solver may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicId {
    /// Evolution-based search with crossover and mutation.
    GeneticAlgorithm,
    /// Probabilistic hill climbing with a cooling schedule.
    SimulatedAnnealing,
    /// Local search with a memory of recent moves.
    TabuSearch,
    /// Greedy local search that never accepts a worse move.
    HillClimbing,
    /// Constraint propagation and search.
    ConstraintProgramming,
    /// Genetic algorithm combined with local search.
    Hybrid,
}

impl HeuristicId {
    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            HeuristicId::GeneticAlgorithm => "Genetic Algorithm",
            HeuristicId::SimulatedAnnealing => "Simulated Annealing",
            HeuristicId::TabuSearch => "Tabu Search",
            HeuristicId::HillClimbing => "Hill Climbing",
            HeuristicId::ConstraintProgramming => "Constraint Programming",
            HeuristicId::Hybrid => "Hybrid Algorithm",
        }
    }
}

/// Teaching hours of a school day, used to compute room occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolDay {
    /// First bell.
    pub start: NaiveTime,
    /// Last bell.
    pub end: NaiveTime,
}

impl SchoolDay {
    /// Creates a school day.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Length in minutes (zero or negative if misconfigured).
    pub fn minutes(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_minutes()
    }
}

impl Default for SchoolDay {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(15, 0, 0).unwrap_or_default(),
        }
    }
}

/// Settings for one optimization run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    /// Wall-clock budget for the solver.
    #[serde(rename = "time_budget_ms", with = "duration_ms")]
    pub time_budget: Duration,
    /// Weight per fitness category. Only listed categories are evaluated.
    pub category_weights: BTreeMap<FitnessCategory, f64>,
    /// Heuristics the solver may use.
    pub enabled_heuristics: BTreeSet<HeuristicId>,
    /// Upper bound on solver iterations.
    pub max_iterations: u64,
    /// Stop after this many iterations without improvement.
    pub stagnation_limit: u64,
    /// Stop once the weighted total reaches this value.
    pub target_fitness: Option<f64>,
    /// Report progress every N iterations.
    pub progress_interval: u64,
    /// Teaching hours, for room utilization.
    pub school_day: SchoolDay,
    /// Seed for reproducible runs. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(300),
            category_weights: FitnessCategory::ALL
                .iter()
                .map(|c| (*c, c.kind().base_weight()))
                .collect(),
            enabled_heuristics: BTreeSet::from([HeuristicId::HillClimbing]),
            max_iterations: 1000,
            stagnation_limit: 100,
            target_fitness: None,
            progress_interval: 10,
            school_day: SchoolDay::default(),
            seed: None,
        }
    }
}

impl OptimizationConfig {
    /// Parses a configuration from TOML. Missing keys take their defaults.
    ///
    /// The result is not validated; see [`OptimizationConfig::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(text).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    /// Sets the time budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Replaces the category weights.
    pub fn with_weights<I>(mut self, weights: I) -> Self
    where
        I: IntoIterator<Item = (FitnessCategory, f64)>,
    {
        self.category_weights = weights.into_iter().collect();
        self
    }

    /// Sets one category weight.
    pub fn with_weight(mut self, category: FitnessCategory, weight: f64) -> Self {
        self.category_weights.insert(category, weight);
        self
    }

    /// Replaces the enabled heuristics.
    pub fn with_heuristics<I>(mut self, heuristics: I) -> Self
    where
        I: IntoIterator<Item = HeuristicId>,
    {
        self.enabled_heuristics = heuristics.into_iter().collect();
        self
    }

    /// Sets the iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the stagnation limit.
    pub fn with_stagnation_limit(mut self, limit: u64) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Sets the target fitness.
    pub fn with_target_fitness(mut self, target: f64) -> Self {
        self.target_fitness = Some(target);
        self
    }

    /// Sets the progress reporting interval.
    pub fn with_progress_interval(mut self, every: u64) -> Self {
        self.progress_interval = every;
        self
    }

    /// Sets the school day.
    pub fn with_school_day(mut self, school_day: SchoolDay) -> Self {
        self.school_day = school_day;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks the configuration before a run is started.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.time_budget.is_zero() {
            return Err(ConfigurationError::ZeroTimeBudget);
        }
        if self.enabled_heuristics.is_empty() {
            return Err(ConfigurationError::NoHeuristics);
        }
        if let Some((&category, &weight)) = self
            .category_weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ConfigurationError::InvalidWeight { category, weight });
        }
        if self.school_day.start >= self.school_day.end {
            return Err(ConfigurationError::InvalidSchoolDay {
                start: self.school_day.start,
                end: self.school_day.end,
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigurationError::ZeroIterations);
        }
        if self.progress_interval == 0 {
            return Err(ConfigurationError::ZeroProgressInterval);
        }
        if let Some(target) = self.target_fitness {
            if !(0.0..=1.0).contains(&target) {
                return Err(ConfigurationError::InvalidTargetFitness(target));
            }
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
