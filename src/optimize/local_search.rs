//! Built-in slot-swap local search.
//!
//! # Algorithm
//!
//! Each iteration picks two assignments at random and exchanges their time
//! slots. The move is kept or undone by the acceptance rule of the selected
//! heuristic:
//!
//! | Heuristic | Acceptance |
//! |-----------|------------|
//! | `HillClimbing` | candidate score >= current score |
//! | `SimulatedAnnealing` | improving moves always; worsening moves with probability `exp(Δ / T)` |
//!
//! The SA temperature starts at [`INITIAL_TEMPERATURE`] and is multiplied by
//! [`COOLING_RATE`] after every iteration. When both heuristics are enabled,
//! simulated annealing is used.
//!
//! The search stops on cancellation, time budget, iteration limit,
//! stagnation, or once the best score reaches `target_fitness`.
//!
//! # Reference
//! Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use super::{HeuristicId, OptimizationConfig, RawOutcome, SolveContext, Solver, StopReason};
use crate::error::SolverError;
use crate::fitness::FitnessEvaluator;
use crate::models::Schedule;

/// Starting temperature for simulated annealing, in score units.
pub const INITIAL_TEMPERATURE: f64 = 0.05;

/// Geometric cooling factor applied per iteration.
pub const COOLING_RATE: f64 = 0.995;

const IMPROVEMENT_EPSILON: f64 = 1e-12;

/// Reference solver exchanging time slots between assignments.
///
/// Resources stay attached to their assignments; only `slot` moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSearchSolver;

impl LocalSearchSolver {
    /// Creates the solver.
    pub fn new() -> Self {
        Self
    }

    fn select_heuristic(config: &OptimizationConfig) -> Result<HeuristicId, SolverError> {
        let enabled = &config.enabled_heuristics;
        if enabled.contains(&HeuristicId::SimulatedAnnealing) {
            Ok(HeuristicId::SimulatedAnnealing)
        } else if enabled.contains(&HeuristicId::HillClimbing) {
            Ok(HeuristicId::HillClimbing)
        } else {
            Err(SolverError::UnsupportedHeuristics(
                enabled.iter().copied().collect(),
            ))
        }
    }
}

impl Solver for LocalSearchSolver {
    fn name(&self) -> &str {
        "local-search"
    }

    fn solve(
        &self,
        schedule: &Schedule,
        config: &OptimizationConfig,
        ctx: &mut SolveContext<'_>,
    ) -> Result<RawOutcome, SolverError> {
        let heuristic = Self::select_heuristic(config)?;
        let evaluator = FitnessEvaluator::new(config);
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let started = Instant::now();
        let mut current = schedule.clone();
        let mut current_score = evaluator.score(&current);
        let mut best = current.clone();
        let mut best_score = current_score;
        let mut temperature = INITIAL_TEMPERATURE;
        let mut since_improvement = 0u64;
        let mut iterations = 0u64;
        let n = current.assignments.len();

        let stop_reason = loop {
            if ctx.is_cancelled() {
                break StopReason::Cancelled;
            }
            if config.target_fitness.is_some_and(|t| best_score >= t) {
                break StopReason::TargetReached;
            }
            if started.elapsed() >= config.time_budget {
                break StopReason::TimeBudget;
            }
            if iterations >= config.max_iterations {
                break StopReason::IterationLimit;
            }
            if n < 2 || since_improvement >= config.stagnation_limit {
                break StopReason::Stagnated;
            }

            iterations += 1;
            let i = rng.random_range(0..n);
            let j = (i + rng.random_range(1..n)) % n;
            swap_slots(&mut current, i, j);

            let candidate_score = evaluator.score(&current);
            let delta = candidate_score - current_score;
            let accept = match heuristic {
                HeuristicId::SimulatedAnnealing => {
                    delta >= 0.0 || rng.random::<f64>() < (delta / temperature).exp()
                }
                _ => delta >= 0.0,
            };
            if accept {
                current_score = candidate_score;
            } else {
                swap_slots(&mut current, i, j);
            }
            temperature *= COOLING_RATE;

            if current_score > best_score + IMPROVEMENT_EPSILON {
                best = current.clone();
                best_score = current_score;
                since_improvement = 0;
            } else {
                since_improvement += 1;
            }

            if config.progress_interval > 0 && iterations % config.progress_interval == 0 {
                let fraction = iterations as f64 / config.max_iterations as f64;
                ctx.report(fraction, best_score, iterations);
            }
        };

        log::debug!(
            "{} stopped after {} iterations ({:?}), best {:.4}",
            heuristic.display_name(),
            iterations,
            stop_reason,
            best_score
        );

        Ok(RawOutcome {
            schedule: best,
            best_score,
            iterations,
            stop_reason,
        })
    }
}

fn swap_slots(schedule: &mut Schedule, i: usize, j: usize) {
    let slot = schedule.assignments[i].slot;
    schedule.assignments[i].slot = schedule.assignments[j].slot;
    schedule.assignments[j].slot = slot;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::detect;
    use crate::models::{Assignment, TimeSlot};
    use crate::optimize::CancellationToken;
    use chrono::Weekday;

    fn slot(day: Weekday, start: &str, end: &str) -> TimeSlot {
        TimeSlot::parse(day, start, end).unwrap()
    }

    fn conflicted() -> Schedule {
        Schedule::new("S1", "Fall")
            .with_assignment(
                Assignment::new(1, slot(Weekday::Mon, "09:00", "10:00"))
                    .with_teacher("T1")
                    .with_room("R1")
                    .with_course("MATH"),
            )
            .with_assignment(
                Assignment::new(2, slot(Weekday::Mon, "09:00", "10:00"))
                    .with_teacher("T1")
                    .with_room("R2")
                    .with_course("PHYS"),
            )
            .with_assignment(
                Assignment::new(3, slot(Weekday::Tue, "09:00", "10:00"))
                    .with_teacher("T2")
                    .with_room("R3")
                    .with_course("CHEM"),
            )
    }

    fn run(
        schedule: &Schedule,
        config: &OptimizationConfig,
        token: CancellationToken,
    ) -> (Result<RawOutcome, SolverError>, Vec<f64>) {
        let mut fractions = Vec::new();
        let result = {
            let mut sink = |f: f64, _best: f64, _i: u64| fractions.push(f);
            let mut ctx = SolveContext::new(token, &mut sink);
            LocalSearchSolver::new().solve(schedule, config, &mut ctx)
        };
        (result, fractions)
    }

    #[test]
    fn test_hill_climbing_removes_conflict() {
        let schedule = conflicted();
        let config = OptimizationConfig::default()
            .with_seed(42)
            .with_max_iterations(200)
            .with_progress_interval(5);
        let before = FitnessEvaluator::new(&config).score(&schedule);

        let (result, fractions) = run(&schedule, &config, CancellationToken::new());
        let outcome = result.unwrap();

        assert!(outcome.best_score > before);
        assert!(!detect(&outcome.schedule).has_conflicts());
        assert_eq!(outcome.schedule.assignment_count(), 3);
        assert!(!fractions.is_empty());
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_simulated_annealing_keeps_best() {
        let schedule = conflicted();
        let config = OptimizationConfig::default()
            .with_heuristics([HeuristicId::SimulatedAnnealing])
            .with_seed(7)
            .with_max_iterations(300);
        let evaluator = FitnessEvaluator::new(&config);
        let before = evaluator.score(&schedule);

        let (result, _) = run(&schedule, &config, CancellationToken::new());
        let outcome = result.unwrap();

        assert!(outcome.best_score >= before);
        assert!((evaluator.score(&outcome.schedule) - outcome.best_score).abs() < 1e-10);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let schedule = conflicted();
        let config = OptimizationConfig::default().with_seed(3).with_max_iterations(50);
        let (a, _) = run(&schedule, &config, CancellationToken::new());
        let (b, _) = run(&schedule, &config, CancellationToken::new());
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn test_unsupported_heuristics_rejected() {
        let config = OptimizationConfig::default().with_heuristics([HeuristicId::TabuSearch]);
        let (result, _) = run(&conflicted(), &config, CancellationToken::new());
        assert_eq!(
            result.unwrap_err(),
            SolverError::UnsupportedHeuristics(vec![HeuristicId::TabuSearch])
        );
    }

    #[test]
    fn test_cancelled_before_first_iteration() {
        let token = CancellationToken::new();
        token.cancel();
        let (result, fractions) = run(&conflicted(), &OptimizationConfig::default(), token);
        let outcome = result.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::Cancelled);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.schedule, conflicted());
        assert!(fractions.is_empty());
    }

    #[test]
    fn test_target_reached_stops_immediately() {
        let config = OptimizationConfig::default().with_target_fitness(0.0);
        let (result, _) = run(&conflicted(), &config, CancellationToken::new());
        let outcome = result.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::TargetReached);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_single_assignment_stagnates() {
        let schedule = Schedule::new("S1", "Fall")
            .with_assignment(Assignment::new(1, slot(Weekday::Mon, "09:00", "10:00")));
        let (result, _) = run(&schedule, &OptimizationConfig::default(), CancellationToken::new());
        assert_eq!(result.unwrap().stop_reason, StopReason::Stagnated);
    }

    #[test]
    fn test_iteration_limit() {
        let config = OptimizationConfig::default()
            .with_seed(1)
            .with_max_iterations(5)
            .with_stagnation_limit(1000);
        let (result, _) = run(&conflicted(), &config, CancellationToken::new());
        let outcome = result.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::IterationLimit);
        assert_eq!(outcome.iterations, 5);
    }
}
