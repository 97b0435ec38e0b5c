use serde::Serialize;

use crate::derive::PLACEHOLDER_GAS_PER_STEP;
use crate::opcodes;
use crate::scenario::Scenario;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpcodeGas {
    pub opcode: String,
    pub gas: u64,
    // Percent of all attributed gas.
    pub share: f64,
    pub base_gas: Option<u64>,
}

// Each step's increase in gas used is charged to its first opcode.
pub fn gas_profile(scenario: &Scenario) -> Vec<OpcodeGas> {
    let mut totals: Vec<(String, u64)> = Vec::new();
    let mut previous = 0u64;
    for (index, step) in scenario.steps.iter().enumerate() {
        let used = step.gas_used.unwrap_or(index as u64 * PLACEHOLDER_GAS_PER_STEP);
        let delta = used.saturating_sub(previous);
        previous = used;
        let Some(mnemonic) = step.mnemonic() else { continue };
        match totals.iter_mut().find(|(name, _)| name == mnemonic) {
            Some((_, gas)) => *gas += delta,
            None => totals.push((mnemonic.to_string(), delta)),
        }
    }

    let total: u64 = totals.iter().map(|(_, g)| g).sum();
    let mut out: Vec<OpcodeGas> = totals
        .into_iter()
        .map(|(opcode, gas)| OpcodeGas {
            share: if total == 0 { 0.0 } else { gas as f64 * 100.0 / total as f64 },
            base_gas: opcodes::gas_of(&opcode),
            opcode,
            gas,
        })
        .collect();
    out.sort_by(|a, b| b.gas.cmp(&a.gas));
    out
}
