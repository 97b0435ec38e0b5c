use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::derive::{Deriver, Snapshot};
use crate::scenario::Scenario;
use crate::types::{Memory, Stack, Storage, Transaction, WorldState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionState {
    pub current_step: usize,
    pub total_steps: usize,
    pub is_running: bool,
    pub transaction: Transaction,
    pub snapshot: Snapshot,
}

// `snapshot` is always a fresh derivation of the current step.
#[derive(Debug, Clone)]
pub struct Simulation {
    scenario: Scenario,
    transaction: Transaction,
    current_step: usize,
    running: bool,
    deriver: Deriver,
    snapshot: Snapshot,
}

impl Simulation {
    pub fn new(scenario: Scenario, cfg: &EngineConfig) -> Self {
        let deriver = Deriver::new(cfg.initial_world.clone());
        let transaction = scenario.transaction.clone();
        let snapshot = initial_snapshot(&deriver, &scenario, &transaction);
        Self { scenario, transaction, current_step: 0, running: false, deriver, snapshot }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn total_steps(&self) -> usize {
        self.scenario.total_steps()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn current_opcode(&self) -> &str {
        &self.snapshot.current_opcode
    }

    pub fn gas_used(&self) -> u64 {
        self.snapshot.gas_used
    }

    pub fn gas_remaining(&self) -> i128 {
        self.snapshot.gas_remaining
    }

    pub fn stack(&self) -> &Stack {
        &self.snapshot.stack
    }

    pub fn memory(&self) -> &Memory {
        &self.snapshot.memory
    }

    pub fn storage(&self) -> &Storage {
        &self.snapshot.storage
    }

    pub fn world_state(&self) -> &WorldState {
        &self.snapshot.world_state
    }

    pub fn is_at_end(&self) -> bool {
        self.current_step >= self.total_steps()
    }

    pub fn state(&self) -> ExecutionState {
        ExecutionState {
            current_step: self.current_step,
            total_steps: self.total_steps(),
            is_running: self.running,
            transaction: self.transaction.clone(),
            snapshot: self.snapshot.clone(),
        }
    }

    pub fn load_scenario(&mut self, scenario: Scenario) {
        info!(name = %scenario.name, steps = scenario.steps.len(), "loading scenario");
        self.transaction = scenario.transaction.clone();
        self.scenario = scenario;
        self.reset();
    }

    // Steps are not regenerated for the new transaction.
    pub fn set_transaction(&mut self, tx: Transaction) {
        info!(from = %tx.from, to = %tx.to, gas_limit = tx.gas_limit, "transaction replaced");
        self.transaction = tx;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.current_step = 0;
        self.running = false;
        self.snapshot = initial_snapshot(&self.deriver, &self.scenario, &self.transaction);
    }

    pub fn step_forward(&mut self) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.move_to(self.current_step + 1)
    }

    pub fn step_backward(&mut self) -> bool {
        if self.current_step == 0 {
            return false;
        }
        self.move_to(self.current_step - 1)
    }

    pub fn seek(&mut self, step: usize) -> bool {
        if step > self.total_steps() {
            debug!(step, total = self.total_steps(), "ignoring out of range seek");
            return false;
        }
        self.move_to(step)
    }

    // Starting at the last step does nothing.
    pub fn start(&mut self) -> bool {
        if self.running || self.is_at_end() {
            return false;
        }
        self.running = true;
        true
    }

    pub fn pause(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    // Returns whether the run continues.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.step_forward();
        if self.is_at_end() {
            info!(step = self.current_step, "reached final step, stopping");
            self.running = false;
        }
        self.running
    }

    fn move_to(&mut self, step: usize) -> bool {
        let previous = &self.snapshot.world_state;
        match self.deriver.derive(&self.scenario, step, &self.transaction, previous) {
            Some(snapshot) => {
                self.current_step = step;
                self.snapshot = snapshot;
                true
            }
            None => false,
        }
    }
}

fn initial_snapshot(deriver: &Deriver, scenario: &Scenario, tx: &Transaction) -> Snapshot {
    deriver
        .derive(scenario, 0, tx, &deriver.initial_world)
        .unwrap_or_else(|| Snapshot {
            step: 0,
            current_opcode: String::new(),
            gas_used: 0,
            gas_remaining: i128::from(tx.gas_limit),
            stack: Stack::default(),
            memory: Memory::default(),
            storage: Storage::default(),
            world_state: deriver.initial_world.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::simple_transfer;
    use crate::derive::derive_state;
    use crate::scenario::{storage_word, Step};
    use crate::types::{DEFAULT_RECIPIENT, DEFAULT_SENDER};
    use pretty_assertions::assert_eq;

    fn sim() -> Simulation {
        Simulation::new(simple_transfer(), &EngineConfig::default())
    }

    #[test]
    fn starts_idle_at_zero() {
        let s = sim();
        assert_eq!(s.current_step(), 0);
        assert_eq!(s.total_steps(), 10);
        assert!(!s.is_running());
        assert!(s.stack().items.is_empty());
        assert_eq!(s.memory(), &Memory::default());
        assert!(s.storage().slots.is_empty());
        assert_eq!(s.current_opcode(), "");
        assert_eq!(s.gas_remaining(), 21_000);
    }

    #[test]
    fn stepping_is_clamped() {
        let mut s = sim();
        assert!(!s.step_backward());
        assert_eq!(s.current_step(), 0);
        for _ in 0..20 {
            s.step_forward();
        }
        assert_eq!(s.current_step(), 10);
        assert!(!s.step_forward());
        assert_eq!(s.current_step(), 10);
        assert!(s.step_backward());
        assert_eq!(s.current_step(), 9);
    }

    #[test]
    fn reset_matches_fresh_derivation() {
        let mut s = sim();
        s.seek(7);
        s.start();
        s.reset();
        assert_eq!(s.current_step(), 0);
        assert!(!s.is_running());
        let expected = derive_state(s.scenario(), 0, s.transaction()).unwrap();
        assert_eq!(s.snapshot(), &expected);
    }

    #[test]
    fn seek_out_of_range_keeps_snapshot() {
        let mut s = sim();
        s.seek(3);
        let before = s.snapshot().clone();
        assert!(!s.seek(11));
        assert_eq!(s.current_step(), 3);
        assert_eq!(s.snapshot(), &before);
    }

    #[test]
    fn walk_through_simple_transfer() {
        let mut s = sim();
        s.seek(6);
        assert_eq!(s.current_opcode(), "SSTORE");
        assert_eq!(s.storage().slots.get("0x0"), Some(&storage_word(0x60)));
        assert_eq!(s.gas_used(), 5014);

        s.seek(10);
        assert_eq!(s.gas_used(), 21_000);
        assert_eq!(s.gas_remaining(), 0);
        assert_eq!(s.storage().slots.len(), 2);
        assert!(s.storage().slots.contains_key("0x1"));
        let world = s.world_state();
        assert_eq!(world.accounts[DEFAULT_SENDER].nonce, 6);
        assert_eq!(world.accounts[DEFAULT_RECIPIENT].balance, "5.100");
    }

    #[test]
    fn set_transaction_resets_without_touching_steps() {
        let mut s = sim();
        s.seek(5);
        let mut tx = s.transaction().clone();
        tx.gas_limit = 50_000;
        s.set_transaction(tx);
        assert_eq!(s.current_step(), 0);
        assert_eq!(s.gas_remaining(), 50_000);
        assert_eq!(s.scenario(), &simple_transfer());
    }

    #[test]
    fn load_scenario_takes_its_transaction() {
        let mut s = sim();
        s.seek(4);
        s.start();
        let mut other = Scenario::blank();
        other.transaction.gas_limit = 99;
        other.steps.push(Step::new("one more"));
        s.load_scenario(other);
        assert_eq!(s.current_step(), 0);
        assert!(!s.is_running());
        assert_eq!(s.total_steps(), 1);
        assert_eq!(s.gas_remaining(), 99);
    }

    #[test]
    fn tick_stops_on_the_last_step() {
        let mut s = sim();
        assert!(!s.tick());
        assert_eq!(s.current_step(), 0);

        s.start();
        for _ in 0..9 {
            assert!(s.tick());
        }
        assert_eq!(s.current_step(), 9);
        assert!(!s.tick());
        assert_eq!(s.current_step(), 10);
        assert!(!s.is_running());
        assert!(!s.start());
    }

    #[test]
    fn start_twice_is_idempotent() {
        let mut s = sim();
        assert!(s.start());
        assert!(!s.start());
        assert!(s.pause());
        assert!(!s.pause());
    }
}
