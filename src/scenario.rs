use std::collections::BTreeMap;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::types::{Transaction, WorldStateOverride, DEFAULT_RECIPIENT, DEFAULT_SENDER};

// Absolute state as of this step, not a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub description: String,
    #[serde(default)]
    pub opcodes: Vec<String>,
    #[serde(default)]
    pub stack: Vec<String>,
    #[serde(default)]
    pub memory: String,
    #[serde(default)]
    pub storage: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_state: Option<WorldStateOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_remaining: Option<u64>,
}

impl Step {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            opcodes: Vec::new(),
            stack: Vec::new(),
            memory: "0x".to_string(),
            storage: BTreeMap::new(),
            world_state: None,
            gas_used: None,
            gas_remaining: None,
        }
    }

    pub fn mnemonic(&self) -> Option<&str> {
        self.opcodes.first().and_then(|op| op.split_whitespace().next())
    }

    pub fn set_opcodes_from_lines(&mut self, text: &str) {
        self.opcodes = split_lines(text);
    }

    pub fn set_stack_from_lines(&mut self, text: &str) {
        self.stack = split_lines(text);
    }

    // Leaves storage untouched on error.
    pub fn set_storage_from_json(&mut self, text: &str) -> Result<(), serde_json::Error> {
        self.storage = serde_json::from_str(text)?;
        Ok(())
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Basic,
    Tokens,
    Defi,
    Security,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub transaction: Transaction,
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
}

impl Scenario {
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            transaction: Transaction {
                from: DEFAULT_SENDER.to_string(),
                to: DEFAULT_RECIPIENT.to_string(),
                value: "0".to_string(),
                gas_limit: 21_000,
                gas_price: 20,
                data: "0x".to_string(),
                nonce: 0,
            },
            steps: vec![Step::new("Initial state")],
            category: None,
            author: None,
            tags: None,
            complexity: None,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn step_mut(&mut self, index: usize) -> Option<&mut Step> {
        self.steps.get_mut(index)
    }

    pub fn add_step(&mut self) -> usize {
        let index = self.steps.len();
        self.steps.push(Step::new(format!("Step {index}")));
        index
    }

    // Never removes the last remaining step.
    pub fn remove_step(&mut self, index: usize) -> Option<Step> {
        if self.steps.len() <= 1 || index >= self.steps.len() {
            return None;
        }
        Some(self.steps.remove(index))
    }
}

pub fn storage_word(value: u64) -> String {
    let mut buf = [0u8; 32];
    U256::from(value).to_big_endian(&mut buf);
    format!("0x{}", hex::encode(buf))
}
