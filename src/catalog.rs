use std::collections::BTreeMap;
use std::sync::OnceLock;

use thiserror::Error;
use tracing::{info, warn};

use crate::scenario::{storage_word, Category, Complexity, Scenario, Step};
use crate::types::{Account, Transaction, WorldStateOverride, DEFAULT_RECIPIENT, DEFAULT_SENDER};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("malformed scenario: {0}")]
    Malformed(String),
    #[error("invalid scenario: {0}")]
    Invalid(String),
    #[error("unknown scenario: {0}")]
    NotFound(String),
    #[error("failed to encode scenario: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
}

pub fn import_json(text: &str) -> Result<Scenario, ScenarioError> {
    let scenario: Scenario = serde_json::from_str(text).map_err(|e| {
        warn!(error = %e, "rejected scenario import");
        ScenarioError::Malformed(e.to_string())
    })?;
    validate(&scenario)?;
    Ok(scenario)
}

pub fn export_json(scenario: &Scenario) -> Result<String, ScenarioError> {
    Ok(serde_json::to_string_pretty(scenario)?)
}

pub fn export_file_name(scenario: &Scenario) -> String {
    let slug = scenario.name.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase();
    format!("{slug}-scenario.json")
}

fn validate(scenario: &Scenario) -> Result<(), ScenarioError> {
    if scenario.steps.is_empty() {
        return Err(ScenarioError::Invalid("scenario has no steps".into()));
    }
    if scenario.transaction.gas_limit == 0 {
        return Err(ScenarioError::Invalid("transaction gasLimit must be positive".into()));
    }
    if scenario.transaction.from.is_empty() || scenario.transaction.to.is_empty() {
        return Err(ScenarioError::Invalid("transaction addresses must not be empty".into()));
    }
    Ok(())
}

pub fn built_in() -> &'static [Scenario] {
    static CATALOG: OnceLock<Vec<Scenario>> = OnceLock::new();
    CATALOG.get_or_init(|| vec![simple_transfer(), erc20_transfer()])
}

#[derive(Debug, Default)]
pub struct ScenarioStore {
    custom: Vec<Scenario>,
}

impl ScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_built_in(&self) -> &'static [Scenario] {
        built_in()
    }

    pub fn custom(&self) -> &[Scenario] {
        &self.custom
    }

    pub fn import(&mut self, text: &str) -> Result<&Scenario, ScenarioError> {
        let scenario = import_json(text)?;
        Ok(self.add(scenario))
    }

    pub fn add(&mut self, scenario: Scenario) -> &Scenario {
        info!(name = %scenario.name, steps = scenario.steps.len(), "added custom scenario");
        self.custom.push(scenario);
        &self.custom[self.custom.len() - 1]
    }

    // Custom scenarios first, case-insensitive.
    pub fn find(&self, name: &str) -> Option<&Scenario> {
        self.custom
            .iter()
            .rev()
            .chain(built_in().iter())
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Result<Scenario, ScenarioError> {
        self.find(name).cloned().ok_or_else(|| ScenarioError::NotFound(name.to_string()))
    }
}

pub(crate) const TRANSFER_BYTECODE: &str = "0x608060405234801561001057600080fd5b5060f78061001f6000396000f3fe6080604052348015600f57600080fd5b506004361060285760003560e01c8063771602f714602d575b600080fd5b605660048036036040811015604157600080fd5b8101908080359060200190929190803590602001909291905050506058565b005b8082016000819055505056fea2646970667358221220c8daade51f385271f21c2b8e19adf4e2bbe5730a152e3603762723a0d7f3f05364736f6c634300060c0033";

fn step(
    description: &str,
    opcodes: &[&str],
    stack: &[u64],
    memory: &[u64],
    storage: &[(&str, u64)],
    gas_used: Option<u64>,
) -> Step {
    let memory = if memory.is_empty() {
        String::new()
    } else {
        let words: String = memory.iter().map(|w| storage_word(*w)[2..].to_string()).collect();
        format!("0x{words}")
    };
    Step {
        description: description.to_string(),
        opcodes: opcodes.iter().map(|s| s.to_string()).collect(),
        stack: stack.iter().map(|w| storage_word(*w)).collect(),
        memory,
        storage: storage.iter().map(|(k, v)| (k.to_string(), storage_word(*v))).collect(),
        world_state: None,
        gas_used,
        gas_remaining: None,
    }
}

pub fn simple_transfer() -> Scenario {
    let mem: &[u64] = &[0x60, 0x40];
    let one_slot: &[(&str, u64)] = &[("0x0", 0x60)];
    let two_slots: &[(&str, u64)] = &[("0x0", 0x60), ("0x1", 0x40)];
    Scenario {
        name: "Simple Ethereum Transfer".into(),
        description: "This scenario demonstrates a basic ETH transfer between two accounts, showing how the EVM processes simple transactions.".into(),
        transaction: Transaction {
            from: DEFAULT_SENDER.into(),
            to: DEFAULT_RECIPIENT.into(),
            value: "0.1".into(),
            gas_limit: 21_000,
            gas_price: 20,
            data: TRANSFER_BYTECODE.into(),
            nonce: 5,
        },
        steps: vec![
            step(
                "The transaction is ready to begin execution. The EVM prepares to process a request to transfer 0.1 ETH from one account to another.",
                &[],
                &[],
                &[],
                &[],
                None,
            ),
            step(
                "PUSH1 places the 1-byte value 0x60 (96) on the stack. It will be used for memory allocation.",
                &["PUSH1 0x60"],
                &[0x60],
                &[],
                &[],
                Some(3),
            ),
            step(
                "Another value, 0x40 (64), is pushed. The stack is last-in-first-out, so 0x40 is now on top.",
                &["PUSH1 0x40"],
                &[0x60, 0x40],
                &[],
                &[],
                Some(6),
            ),
            step(
                "MSTORE pops an address (0x40) and a value (0x60) and writes the value to memory, initializing Solidity's free memory pointer.",
                &["MSTORE"],
                &[],
                &[0x60],
                &[],
                Some(9),
            ),
            step(
                "CALLVALUE pushes the wei sent with the transaction so the contract can check whether it is payable.",
                &["CALLVALUE"],
                &[0x1],
                mem,
                &[],
                Some(11),
            ),
            step(
                "ISZERO pops the top value and pushes 1 if it was zero, 0 otherwise.",
                &["ISZERO"],
                &[0x1, 0x1],
                mem,
                &[],
                Some(14),
            ),
            step(
                "SSTORE writes 0x60 into storage slot 0x0. Storage persists between transactions, which makes it one of the most expensive operations.",
                &["SSTORE"],
                &[0x60, 0x40],
                mem,
                one_slot,
                Some(5014),
            ),
            step(
                "The EVM starts committing storage changes to the contract's state tree.",
                &[],
                &[],
                mem,
                one_slot,
                Some(5014),
            ),
            step(
                "A second storage slot is updated. Every storage write touches the account's storage trie.",
                &[],
                &[],
                mem,
                two_slots,
                Some(10014),
            ),
            step(
                "The 0.1 ETH value transfer happens: the sender is debited and the recipient credited.",
                &[],
                &[],
                mem,
                two_slots,
                Some(10014),
            ),
            step(
                "The transaction is complete. State is final, the sender nonce has been incremented and the fee has been paid.",
                &[],
                &[],
                mem,
                two_slots,
                Some(21_000),
            ),
        ],
        category: Some(Category::Basic),
        author: Some("EVM Visualizer Team".into()),
        tags: Some(vec!["transfer".into(), "basic".into(), "ethereum".into()]),
        complexity: Some(Complexity::Beginner),
    }
}

const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

pub fn erc20_transfer() -> Scenario {
    let selector: u64 = 0xa9059cbb;
    let balance_slot = "0x2";
    let mut final_accounts = BTreeMap::new();
    final_accounts.insert(DEFAULT_SENDER.to_string(), Account::eoa("9.999", 6));
    final_accounts.insert(
        USDC.to_string(),
        Account {
            balance: "0.0".into(),
            nonce: 1,
            code_hash: "0x7e6d2e8bc4ef4cdc2a1c3b5f8f7d1b2d4fbbf70f1b64c38c1b7b0c6f02a1c2d3".into(),
            storage_root: "0x3f9a2d1c5b7e8f0a4c6d2e1b9a8f7c6d5e4b3a29181706f5e4d3c2b1a0f9e8d7".into(),
        },
    );

    let mut last = step(
        "Balances are updated and a Transfer event is logged. The sender nonce and fee are settled.",
        &["LOG3"],
        &[],
        &[],
        &[(balance_slot, 0x64)],
        Some(51_650),
    );
    last.world_state = Some(WorldStateOverride { accounts: Some(final_accounts) });

    Scenario {
        name: "ERC-20 Token Transfer".into(),
        description: "Standard ERC-20 token transfer between accounts".into(),
        transaction: Transaction {
            from: DEFAULT_SENDER.into(),
            to: USDC.into(),
            value: "0".into(),
            gas_limit: 60_000,
            gas_price: 20,
            data: "0xa9059cbb000000000000000000000000abcdef1234567890abcdef1234567890abcdef000000000000000000000000000000000000000000000000000000000000000064".into(),
            nonce: 5,
        },
        steps: vec![
            step("Transaction initiated", &[], &[], &[], &[], None),
            step(
                "The first four bytes of calldata are loaded to find the called function.",
                &["PUSH1 0x00", "CALLDATALOAD"],
                &[selector],
                &[],
                &[],
                Some(21_064),
            ),
            step(
                "The selector is compared against transfer(address,uint256).",
                &["PUSH4 0xa9059cbb", "EQ"],
                &[0x1],
                &[],
                &[],
                Some(21_073),
            ),
            step(
                "The sender's token balance is read from storage.",
                &["SLOAD"],
                &[0x3e8],
                &[],
                &[],
                Some(23_173),
            ),
            step(
                "The new recipient balance is written to its storage slot.",
                &["SSTORE"],
                &[],
                &[],
                &[(balance_slot, 0x64)],
                Some(45_273),
            ),
            last,
        ],
        category: Some(Category::Tokens),
        author: Some("EVM Visualizer Team".into()),
        tags: Some(vec!["erc20".into(), "tokens".into()]),
        complexity: Some(Complexity::Intermediate),
    }
}
