// At most one timer task per engine. Leaving the running state aborts it under
// the state lock, and a tick that already woke checks its generation first.
//
// States are queued under the lock and handed to the watch channel by a
// separate task, so a caller holding `Receiver::borrow` never blocks a
// transport call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::{normalize_interval, EngineConfig};
use crate::keys::Command;
use crate::machine::{ExecutionState, Simulation};
use crate::scenario::Scenario;
use crate::types::Transaction;

#[derive(Debug)]
struct Inner {
    sim: Simulation,
    interval: Duration,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Inner {
    fn cancel_timer(&mut self) {
        self.generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
            debug!(generation = self.generation, "timer cancelled");
        }
    }
}

#[derive(Debug)]
pub struct Engine {
    inner: Arc<Mutex<Inner>>,
    outbox: mpsc::UnboundedSender<ExecutionState>,
    updates: watch::Sender<ExecutionState>,
    runtime: Handle,
}

impl Engine {
    // Panics outside a Tokio runtime.
    pub fn new(scenario: Scenario, cfg: EngineConfig) -> Self {
        Self::with_runtime(scenario, cfg, Handle::current())
    }

    pub fn with_runtime(scenario: Scenario, cfg: EngineConfig, runtime: Handle) -> Self {
        let sim = Simulation::new(scenario, &cfg);
        let (updates, _) = watch::channel(sim.state());
        let (outbox, queued) = mpsc::unbounded_channel();
        runtime.spawn(publish(queued, updates.clone()));
        let inner = Inner {
            sim,
            interval: normalize_interval(cfg.interval),
            generation: 0,
            timer: None,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            outbox,
            updates,
            runtime,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ExecutionState> {
        self.updates.subscribe()
    }

    pub fn state(&self) -> ExecutionState {
        self.lock().sim.state()
    }

    pub fn current_step(&self) -> usize {
        self.lock().sim.current_step()
    }

    pub fn total_steps(&self) -> usize {
        self.lock().sim.total_steps()
    }

    pub fn is_running(&self) -> bool {
        self.lock().sim.is_running()
    }

    pub fn current_scenario(&self) -> Scenario {
        self.lock().sim.scenario().clone()
    }

    pub fn transaction(&self) -> Transaction {
        self.lock().sim.transaction().clone()
    }

    pub fn execution_interval(&self) -> Duration {
        self.lock().interval
    }

    pub fn load_scenario(&self, scenario: Scenario) {
        self.update(|inner| {
            inner.cancel_timer();
            inner.sim.load_scenario(scenario);
        });
    }

    pub fn set_transaction(&self, tx: Transaction) {
        self.update(|inner| {
            inner.cancel_timer();
            inner.sim.set_transaction(tx);
        });
    }

    pub fn reset(&self) {
        self.update(|inner| {
            inner.cancel_timer();
            inner.sim.reset();
        });
    }

    pub fn step_forward(&self) {
        self.update(|inner| {
            inner.sim.step_forward();
        });
    }

    pub fn step_backward(&self) {
        self.update(|inner| {
            inner.sim.step_backward();
        });
    }

    pub fn seek(&self, step: usize) {
        self.update(|inner| {
            inner.sim.seek(step);
        });
    }

    // No-op while already running or at the last step.
    pub fn start(&self) {
        self.update(|inner| {
            if inner.sim.start() {
                info!(interval_ms = inner.interval.as_millis() as u64, "simulation started");
                self.spawn_timer(inner);
            }
        });
    }

    pub fn pause(&self) {
        self.update(|inner| {
            if inner.sim.pause() {
                info!(step = inner.sim.current_step(), "simulation paused");
            }
            inner.cancel_timer();
        });
    }

    pub fn toggle(&self) {
        if self.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    // A running simulation keeps running; the next tick is one new interval out.
    pub fn set_execution_interval(&self, interval: Duration) {
        self.update(|inner| {
            inner.interval = normalize_interval(interval);
            if inner.sim.is_running() {
                inner.cancel_timer();
                self.spawn_timer(inner);
            }
        });
    }

    pub fn dispatch(&self, command: Command) {
        match command {
            Command::StepForward => self.step_forward(),
            Command::StepBackward => self.step_backward(),
            Command::TogglePlay => self.toggle(),
            Command::Reset => self.reset(),
        }
    }

    fn spawn_timer(&self, inner: &mut Inner) {
        let task = run_timer(
            Arc::downgrade(&self.inner),
            self.outbox.clone(),
            inner.interval,
            inner.generation,
        );
        inner.timer = Some(self.runtime.spawn(task));
    }

    fn update(&self, f: impl FnOnce(&mut Inner)) {
        let mut inner = self.lock();
        f(&mut inner);
        // Queued under the lock so updates keep their order.
        let _ = self.outbox.send(inner.sim.state());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.lock().cancel_timer();
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn publish(
    mut queued: mpsc::UnboundedReceiver<ExecutionState>,
    updates: watch::Sender<ExecutionState>,
) {
    while let Some(state) = queued.recv().await {
        updates.send_replace(state);
    }
}

async fn run_timer(
    inner: Weak<Mutex<Inner>>,
    outbox: mpsc::UnboundedSender<ExecutionState>,
    period: Duration,
    generation: u64,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(shared) = inner.upgrade() else { break };
        let mut guard = lock(&shared);
        if guard.generation != generation {
            break;
        }
        let keep_running = guard.sim.tick();
        let _ = outbox.send(guard.sim.state());
        if !keep_running {
            guard.timer = None;
            break;
        }
    }
}
