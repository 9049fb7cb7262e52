//! Optimization run controller.
//!
//! Runs a [`Solver`] against a schedule snapshot on a dedicated worker
//! thread, streams progress, and supports cooperative cancellation.
//!
//! # Lifecycle
//!
//! | Step | Thread | Effect |
//! |------|--------|--------|
//! | `start` | caller | validate config, claim the schedule, spawn worker, wait for `Running` |
//! | solve | worker | solver iterates; progress is filtered through a monotonic gate |
//! | finish | worker | terminal state set, `1.0` emitted on `Completed`, schedule released, `Finished` emitted |
//! | `wait` | caller | join the worker and take the [`OptimizationResult`] |
//!
//! Progress delivery and cancellation are serialized: once `cancel`
//! returns `true`, no further progress event reaches the callback. A
//! `cancel` issued from inside the callback does not block.
//!
//! At most one run is active per schedule id. Solver errors and panics are
//! captured and end the run in [`RunState::Failed`]; they never reach the
//! caller as a panic.

use parking_lot::{Mutex, ReentrantMutex};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::{
    CancellationToken, OptimizationConfig, OptimizationResult, Progress, ProgressGate, RunEvent,
    RunState, SolveContext, Solver,
};
use crate::error::{RunError, SolverError};
use crate::fitness::{FitnessBreakdown, FitnessEvaluator, OutcomeReporter};
use crate::models::Schedule;

type Registry = Arc<Mutex<HashMap<String, Uuid>>>;

/// Starts and tracks optimization runs.
///
/// The solver is injected at construction. Clones share the same solver and
/// the same active-run registry.
#[derive(Clone)]
pub struct OptimizationController {
    solver: Arc<dyn Solver>,
    active: Registry,
}

impl std::fmt::Debug for OptimizationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizationController")
            .field("solver", &self.solver.name())
            .field("active", &*self.active.lock())
            .finish()
    }
}

impl OptimizationController {
    /// Creates a controller around a solver.
    pub fn new(solver: Arc<dyn Solver>) -> Self {
        Self {
            solver,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Starts a run without progress reporting.
    ///
    /// See [`OptimizationController::start_with_progress`].
    pub fn start(
        &self,
        schedule: &Schedule,
        config: OptimizationConfig,
    ) -> Result<RunHandle, RunError> {
        self.start_with_progress(schedule, config, |_| {})
    }

    /// Starts a run, delivering [`RunEvent`]s to `on_event` from the worker.
    ///
    /// The schedule is snapshotted; later changes to the caller's copy do
    /// not affect the run. Returns once the worker has entered
    /// [`RunState::Running`].
    ///
    /// # Errors
    ///
    /// - [`RunError::Configuration`] if `config` is invalid (no worker spawned)
    /// - [`RunError::AlreadyActive`] if the schedule already has an active run
    /// - [`RunError::Spawn`] / [`RunError::WorkerLost`] if the worker could not start
    pub fn start_with_progress<F>(
        &self,
        schedule: &Schedule,
        config: OptimizationConfig,
        on_event: F,
    ) -> Result<RunHandle, RunError>
    where
        F: Fn(RunEvent) + Send + 'static,
    {
        if let Err(err) = config.validate() {
            log::warn!("rejected optimization of schedule '{}': {}", schedule.id, err);
            return Err(err.into());
        }

        let run_id = Uuid::new_v4();
        let guard = ActiveRunGuard::acquire(&self.active, &schedule.id, run_id)?;

        let token = CancellationToken::new();
        let shared = Arc::new(RunShared::default());
        let (ready_tx, ready_rx) = mpsc::channel();

        let job = RunJob {
            run_id,
            schedule: schedule.clone(),
            config,
            solver: Arc::clone(&self.solver),
            token: token.clone(),
            shared: Arc::clone(&shared),
        };

        let worker = thread::Builder::new()
            .name(format!("optimize-{}", schedule.id))
            .spawn(move || job.run(guard, ready_tx, on_event))?;

        if ready_rx.recv().is_err() {
            log::warn!("optimization worker for run {} exited before starting", run_id);
            return Err(RunError::WorkerLost);
        }

        log::debug!(
            "run {} started for schedule '{}' with {}",
            run_id,
            schedule.id,
            self.solver.name()
        );

        Ok(RunHandle {
            run_id,
            schedule_id: schedule.id.clone(),
            token,
            shared,
            worker,
        })
    }

    /// Requests cooperative cancellation. See [`RunHandle::cancel`].
    pub fn cancel(&self, handle: &RunHandle) -> bool {
        handle.cancel()
    }

    /// Blocks until the run reaches a terminal state. See [`RunHandle::wait`].
    pub fn wait(&self, handle: RunHandle) -> OptimizationResult {
        handle.wait()
    }

    /// Whether a run is active for the schedule.
    pub fn is_active(&self, schedule_id: &str) -> bool {
        self.active.lock().contains_key(schedule_id)
    }

    /// Active runs as `(schedule_id, run_id)`, sorted by schedule id.
    pub fn active_runs(&self) -> Vec<(String, Uuid)> {
        let mut runs: Vec<(String, Uuid)> = self
            .active
            .lock()
            .iter()
            .map(|(schedule_id, run_id)| (schedule_id.clone(), *run_id))
            .collect();
        runs.sort();
        runs
    }
}

/// Caller-side handle of a started run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: Uuid,
    schedule_id: String,
    token: CancellationToken,
    shared: Arc<RunShared>,
    worker: JoinHandle<OptimizationResult>,
}

impl RunHandle {
    /// Run identifier.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Schedule the run was started against.
    pub fn schedule_id(&self) -> &str {
        &self.schedule_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        *self.shared.state.lock()
    }

    /// Most recent progress delivered, if any.
    pub fn last_progress(&self) -> Option<Progress> {
        *self.shared.last_progress.lock()
    }

    /// Whether the worker has exited.
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Requests cooperative cancellation.
    ///
    /// Returns `true` if the request was registered while the run was
    /// `Running`. On a terminal run this is a no-op returning `false`.
    /// Waits for a progress event being delivered on another thread.
    pub fn cancel(&self) -> bool {
        let _delivery = self.shared.delivery.lock();
        let state = self.shared.state.lock();
        if *state != RunState::Running {
            return false;
        }
        self.token.cancel();
        log::debug!("cancellation requested for run {}", self.run_id);
        true
    }

    /// Blocks until the run ends and returns its result.
    pub fn wait(self) -> OptimizationResult {
        match self.worker.join() {
            Ok(result) => result,
            Err(payload) => {
                let message = format!("optimization worker panicked: {}", panic_message(&*payload));
                log::warn!("run {}: {}", self.run_id, message);
                *self.shared.state.lock() = RunState::Failed;
                let before = self.shared.before.lock().take().unwrap_or_default();
                OutcomeReporter::failed(
                    self.run_id,
                    &self.schedule_id,
                    before,
                    message,
                    Duration::ZERO,
                )
            }
        }
    }
}

/// State shared between a handle and its worker.
#[derive(Debug)]
struct RunShared {
    /// Held while a progress event is delivered. Taken before `state`.
    delivery: ReentrantMutex<()>,
    state: Mutex<RunState>,
    last_progress: Mutex<Option<Progress>>,
    before: Mutex<Option<FitnessBreakdown>>,
}

impl Default for RunShared {
    fn default() -> Self {
        Self {
            delivery: ReentrantMutex::new(()),
            state: Mutex::new(RunState::Pending),
            last_progress: Mutex::new(None),
            before: Mutex::new(None),
        }
    }
}

/// Claim on a schedule id in the active-run registry. Released on drop,
/// including when the worker unwinds.
struct ActiveRunGuard {
    registry: Registry,
    schedule_id: String,
    run_id: Uuid,
}

impl ActiveRunGuard {
    fn acquire(registry: &Registry, schedule_id: &str, run_id: Uuid) -> Result<Self, RunError> {
        let mut active = registry.lock();
        if let Some(existing) = active.get(schedule_id) {
            log::warn!(
                "schedule '{}' already has active run {}",
                schedule_id,
                existing
            );
            return Err(RunError::AlreadyActive {
                schedule_id: schedule_id.to_string(),
                run_id: *existing,
            });
        }
        active.insert(schedule_id.to_string(), run_id);
        Ok(Self {
            registry: Arc::clone(registry),
            schedule_id: schedule_id.to_string(),
            run_id,
        })
    }
}

impl Drop for ActiveRunGuard {
    fn drop(&mut self) {
        let mut active = self.registry.lock();
        if active.get(&self.schedule_id) == Some(&self.run_id) {
            active.remove(&self.schedule_id);
        }
    }
}

/// Everything the worker thread owns.
struct RunJob {
    run_id: Uuid,
    schedule: Schedule,
    config: OptimizationConfig,
    solver: Arc<dyn Solver>,
    token: CancellationToken,
    shared: Arc<RunShared>,
}

impl RunJob {
    fn run<F>(self, guard: ActiveRunGuard, ready: mpsc::Sender<()>, on_event: F) -> OptimizationResult
    where
        F: Fn(RunEvent),
    {
        let started = Instant::now();
        *self.shared.state.lock() = RunState::Running;
        let _ = ready.send(());

        let evaluator = FitnessEvaluator::new(&self.config);
        let before = evaluator.evaluate(&self.schedule);
        *self.shared.before.lock() = Some(before.clone());

        let mut gate = ProgressGate::new();
        let outcome = {
            let mut sink = |fraction: f64, best_score: f64, iteration: u64| {
                let _delivery = self.shared.delivery.lock();
                if self.token.is_cancelled() {
                    return;
                }
                if let Some(fraction) = gate.admit(fraction) {
                    let progress = Progress {
                        run_id: self.run_id,
                        fraction,
                        best_score,
                        iteration,
                    };
                    *self.shared.last_progress.lock() = Some(progress);
                    emit(&on_event, RunEvent::Progress(progress));
                }
            };
            let mut ctx = SolveContext::new(self.token.clone(), &mut sink);
            match catch_unwind(AssertUnwindSafe(|| {
                self.solver.solve(&self.schedule, &self.config, &mut ctx)
            })) {
                Ok(outcome) => outcome,
                Err(payload) => Err(SolverError::Panicked(panic_message(&*payload))),
            }
        };

        // Decided under the state lock so a concurrent cancel either lands
        // before the decision or is refused.
        let state = {
            let mut current = self.shared.state.lock();
            let state = OutcomeReporter::terminal_state(&outcome, self.token.is_cancelled());
            *current = state;
            state
        };

        if let Err(err) = &outcome {
            log::warn!("run {} failed: {}", self.run_id, err);
        }

        let result = OutcomeReporter::new().report(
            self.run_id,
            &self.schedule.id,
            &evaluator,
            before,
            outcome,
            state,
            started.elapsed(),
        );

        if state == RunState::Completed {
            let progress = Progress {
                run_id: self.run_id,
                fraction: 1.0,
                best_score: result.after_score,
                iteration: result.iterations,
            };
            *self.shared.last_progress.lock() = Some(progress);
            emit(&on_event, RunEvent::Progress(progress));
        }

        drop(guard);
        log::info!(
            "run {} for schedule '{}': {}",
            self.run_id,
            self.schedule.id,
            result.summary()
        );
        emit(
            &on_event,
            RunEvent::Finished {
                run_id: self.run_id,
                state,
                message: result.message.clone(),
            },
        );
        result
    }
}

/// Delivers an event, containing any panic raised by the callback.
fn emit<F: Fn(RunEvent)>(on_event: &F, event: RunEvent) {
    if catch_unwind(AssertUnwindSafe(|| on_event(event))).is_err() {
        log::warn!("progress callback panicked; event dropped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
