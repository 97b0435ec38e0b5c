use serde::Serialize;
use tracing::debug;

use crate::scenario::Scenario;
use crate::types::{Memory, Stack, Storage, Transaction, WorldState};

pub const PLACEHOLDER_GAS_PER_STEP: u64 = 3;

const PREVIEW_EDGE: usize = 10;
const PREVIEW_THRESHOLD: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub step: usize,
    pub current_opcode: String,
    pub gas_used: u64,
    // Signed: a scenario can overspend its limit.
    pub gas_remaining: i128,
    pub stack: Stack,
    pub memory: Memory,
    pub storage: Storage,
    pub world_state: WorldState,
}

// Fallback for steps without an explicit worldState. Older scenarios depend
// on these thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegacyWorldStateRule {
    pub active_from: usize,
    pub credit_from: usize,
    pub nonce_from: usize,
    pub fee_per_step: f64,
}

impl Default for LegacyWorldStateRule {
    fn default() -> Self {
        Self { active_from: 7, credit_from: 9, nonce_from: 10, fee_per_step: 0.001 }
    }
}

impl LegacyWorldStateRule {
    pub fn applies(&self, step: usize) -> bool {
        step >= self.active_from
    }

    pub fn apply(&self, initial: &WorldState, step: usize, tx: &Transaction) -> WorldState {
        let mut world = initial.clone();

        if let Some(sender) = world.accounts.get_mut(&tx.from) {
            let balance = parse_eth(&sender.balance) - step as f64 * self.fee_per_step;
            sender.balance = format_eth(balance);
            if step >= self.nonce_from {
                sender.nonce += 1;
            }
        } else {
            debug!(from = %tx.from, "sender not in world state, skipping debit");
        }

        if step >= self.credit_from {
            if let Some(recipient) = world.accounts.get_mut(&tx.to) {
                let balance = parse_eth(&recipient.balance) + parse_eth(&tx.value);
                recipient.balance = format_eth(balance);
            } else {
                debug!(to = %tx.to, "recipient not in world state, skipping credit");
            }
        }

        world
    }
}

fn parse_eth(s: &str) -> f64 {
    s.trim().parse().unwrap_or(0.0)
}

fn format_eth(v: f64) -> String {
    format!("{v:.3}")
}

#[derive(Debug, Clone)]
pub struct Deriver {
    pub initial_world: WorldState,
    pub legacy: LegacyWorldStateRule,
}

impl Default for Deriver {
    fn default() -> Self {
        Self { initial_world: WorldState::seeded(), legacy: LegacyWorldStateRule::default() }
    }
}

impl Deriver {
    pub fn new(initial_world: WorldState) -> Self {
        Self { initial_world, ..Self::default() }
    }

    pub fn derive(
        &self,
        scenario: &Scenario,
        step: usize,
        tx: &Transaction,
        previous_world: &WorldState,
    ) -> Option<Snapshot> {
        let data = scenario.steps.get(step)?;

        let current_opcode = data.opcodes.first().cloned().unwrap_or_default();

        let gas_used = data.gas_used.unwrap_or(step as u64 * PLACEHOLDER_GAS_PER_STEP);
        let gas_remaining = i128::from(tx.gas_limit) - i128::from(gas_used);

        let world_state = match &data.world_state {
            Some(patch) => previous_world.merged(patch),
            None if self.legacy.applies(step) => self.legacy.apply(&self.initial_world, step, tx),
            None => self.initial_world.clone(),
        };

        debug!(step, opcode = %current_opcode, gas_used, "derived step");

        Some(Snapshot {
            step,
            current_opcode,
            gas_used,
            gas_remaining,
            stack: Stack { items: data.stack.clone() },
            memory: memory_snapshot(&data.memory),
            storage: Storage { slots: data.storage.clone() },
            world_state,
        })
    }
}

pub fn derive_state(scenario: &Scenario, step: usize, tx: &Transaction) -> Option<Snapshot> {
    let deriver = Deriver::default();
    deriver.derive(scenario, step, tx, &deriver.initial_world)
}

pub fn memory_snapshot(data: &str) -> Memory {
    if data.is_empty() {
        return Memory::default();
    }
    let len = data.chars().count();
    let preview = if len > PREVIEW_THRESHOLD {
        let head: String = data.chars().take(PREVIEW_EDGE).collect();
        let tail: String = data.chars().skip(len - PREVIEW_EDGE).collect();
        format!("{head}...{tail}")
    } else {
        data.to_string()
    };
    Memory { data: data.to_string(), size: len as i64 / 2 - 1, preview }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::simple_transfer;
    use crate::scenario::Step;
    use crate::types::{Account, DEFAULT_RECIPIENT, DEFAULT_SENDER};
    use crate::types::WorldStateOverride;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn bare_scenario(steps: usize) -> Scenario {
        let mut s = Scenario::blank();
        s.transaction.value = "0.1".to_string();
        s.steps = (0..steps).map(|i| Step::new(format!("step {i}"))).collect();
        s
    }

    #[test]
    fn same_inputs_same_output() {
        let s = simple_transfer();
        for k in 0..=s.total_steps() {
            assert_eq!(derive_state(&s, k, &s.transaction), derive_state(&s, k, &s.transaction));
        }
    }

    #[test]
    fn out_of_range_is_none() {
        let s = simple_transfer();
        assert!(derive_state(&s, s.total_steps() + 1, &s.transaction).is_none());
    }

    #[test]
    fn first_opcode_is_current() {
        let mut s = bare_scenario(2);
        s.steps[1].opcodes = vec!["PUSH1 0x60".into(), "PUSH1 0x40".into()];
        let snap = derive_state(&s, 1, &s.transaction).unwrap();
        assert_eq!(snap.current_opcode, "PUSH1 0x60");
        let snap = derive_state(&s, 0, &s.transaction).unwrap();
        assert_eq!(snap.current_opcode, "");
    }

    #[test]
    fn gas_falls_back_to_placeholder() {
        let mut s = bare_scenario(6);
        let snap = derive_state(&s, 4, &s.transaction).unwrap();
        assert_eq!(snap.gas_used, 12);
        assert_eq!(snap.gas_remaining, 21_000 - 12);

        s.steps[4].gas_used = Some(5014);
        let snap = derive_state(&s, 4, &s.transaction).unwrap();
        assert_eq!(snap.gas_used, 5014);
    }

    #[test]
    fn explicit_zero_gas_is_not_replaced() {
        let mut s = bare_scenario(6);
        s.steps[4].gas_used = Some(0);
        let snap = derive_state(&s, 4, &s.transaction).unwrap();
        assert_eq!(snap.gas_used, 0);
        assert_eq!(snap.gas_remaining, 21_000);
    }

    #[test]
    fn gas_remaining_can_go_negative() {
        let mut s = bare_scenario(2);
        s.steps[1].gas_used = Some(30_000);
        let snap = derive_state(&s, 1, &s.transaction).unwrap();
        assert_eq!(snap.gas_remaining, -9_000);
    }

    #[test]
    fn long_memory_is_previewed() {
        let data = format!("0x{}", "ab".repeat(40));
        let mem = memory_snapshot(&data);
        assert_eq!(mem.preview, format!("{}...{}", &data[..10], &data[data.len() - 10..]));
        assert_eq!(mem.size, 40);

        let mem = memory_snapshot("0x60");
        assert_eq!(mem.preview, "0x60");
        assert_eq!(mem.size, 1);

        assert_eq!(memory_snapshot(""), Memory::default());
    }

    #[test]
    fn legacy_rule_below_threshold_keeps_initial_world() {
        let s = bare_scenario(11);
        let snap = derive_state(&s, 6, &s.transaction).unwrap();
        assert_eq!(snap.world_state, WorldState::seeded());
    }

    #[test]
    fn legacy_rule_debits_then_credits() {
        let s = bare_scenario(11);

        let at8 = derive_state(&s, 8, &s.transaction).unwrap().world_state;
        assert_eq!(at8.accounts[DEFAULT_SENDER].balance, "9.992");
        assert_eq!(at8.accounts[DEFAULT_SENDER].nonce, 5);
        assert_eq!(at8.accounts[DEFAULT_RECIPIENT].balance, "5.0");

        let at10 = derive_state(&s, 10, &s.transaction).unwrap().world_state;
        assert_eq!(at10.accounts[DEFAULT_SENDER].balance, "9.990");
        assert_eq!(at10.accounts[DEFAULT_SENDER].nonce, 6);
        assert_eq!(at10.accounts[DEFAULT_RECIPIENT].balance, "5.100");
    }

    #[test]
    fn legacy_rule_skips_unknown_accounts() {
        let mut s = bare_scenario(11);
        s.transaction.from = "0xdead".into();
        let world = derive_state(&s, 10, &s.transaction).unwrap().world_state;
        assert_eq!(world.accounts[DEFAULT_SENDER], WorldState::seeded().accounts[DEFAULT_SENDER]);
        assert_eq!(world.accounts[DEFAULT_RECIPIENT].balance, "5.100");
    }

    #[test]
    fn explicit_world_state_wins_over_legacy() {
        let mut s = bare_scenario(11);
        let mut accounts = BTreeMap::new();
        accounts.insert("0xfeed".to_string(), Account::eoa("1.0", 1));
        s.steps[9].world_state = Some(WorldStateOverride { accounts: Some(accounts.clone()) });
        let snap = derive_state(&s, 9, &s.transaction).unwrap();
        assert_eq!(snap.world_state.accounts, accounts);
    }

    #[test]
    fn empty_patch_keeps_previous_world() {
        let mut s = bare_scenario(3);
        s.steps[2].world_state = Some(WorldStateOverride::default());
        let deriver = Deriver::default();
        let mut previous = WorldState::default();
        previous.accounts.insert("0x01".into(), Account::eoa("3.0", 0));
        let snap = deriver.derive(&s, 2, &s.transaction, &previous).unwrap();
        assert_eq!(snap.world_state, previous);
    }
}
