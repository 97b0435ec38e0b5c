use thiserror::Error;

use crate::catalog::TRANSFER_BYTECODE;
use crate::types::{Transaction, DEFAULT_RECIPIENT, DEFAULT_SENDER};

const DEFAULT_GAS_LIMIT: u64 = 21_000;
const DEFAULT_GAS_PRICE: u64 = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionInputError {
    #[error("From address must be a valid Ethereum address starting with 0x")]
    InvalidFrom,
    #[error("To address must be a valid Ethereum address starting with 0x")]
    InvalidTo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionForm {
    pub from: String,
    pub to: String,
    pub value: String,
    pub gas_limit: String,
    pub gas_price: String,
    pub data: String,
    pub nonce: String,
}

impl TransactionForm {
    pub fn example() -> Self {
        Self {
            from: DEFAULT_SENDER.into(),
            to: DEFAULT_RECIPIENT.into(),
            value: "0.1".into(),
            gas_limit: "21000".into(),
            gas_price: "20".into(),
            data: TRANSFER_BYTECODE.into(),
            nonce: "5".into(),
        }
    }

    // Blank, unparsable and zero numbers fall back to defaults.
    pub fn parse(&self) -> Result<Transaction, TransactionInputError> {
        let from = self.from.trim();
        if !from.starts_with("0x") {
            return Err(TransactionInputError::InvalidFrom);
        }
        let to = self.to.trim();
        if !to.starts_with("0x") {
            return Err(TransactionInputError::InvalidTo);
        }
        Ok(Transaction {
            from: from.to_string(),
            to: to.to_string(),
            value: non_empty(&self.value, "0"),
            gas_limit: number_or(&self.gas_limit, DEFAULT_GAS_LIMIT),
            gas_price: number_or(&self.gas_price, DEFAULT_GAS_PRICE),
            data: non_empty(&self.data, "0x"),
            nonce: number_or(&self.nonce, 0),
        })
    }
}

fn non_empty(raw: &str, default: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        default.to_string()
    } else {
        raw.to_string()
    }
}

fn number_or(raw: &str, default: u64) -> u64 {
    raw.trim().parse::<u64>().ok().filter(|n| *n != 0).unwrap_or(default)
}
