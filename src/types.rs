use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

pub const CREATE_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

pub const EMPTY_CODE_HASH: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";

pub const DEFAULT_SENDER: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
pub const DEFAULT_RECIPIENT: &str = "0x1234567890123456789012345678901234567890";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub from: String,
    pub to: String,
    // Decimal ETH, e.g. "0.1".
    pub value: String,
    pub gas_limit: u64,
    // Gwei
    pub gas_price: u64,
    pub data: String,
    pub nonce: u64,
}

impl Transaction {
    pub fn is_contract_creation(&self) -> bool {
        self.to == CREATE_ADDRESS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub balance: String,
    pub nonce: u64,
    pub code_hash: String,
    pub storage_root: String,
}

impl Account {
    pub fn eoa(balance: &str, nonce: u64) -> Self {
        Self {
            balance: balance.to_string(),
            nonce,
            code_hash: EMPTY_CODE_HASH.to_string(),
            storage_root: empty_storage_root(),
        }
    }

    pub fn is_contract(&self) -> bool {
        self.code_hash != EMPTY_CODE_HASH
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldState {
    pub accounts: BTreeMap<String, Account>,
}

impl WorldState {
    pub fn seeded() -> Self {
        let mut accounts = BTreeMap::new();
        accounts.insert(DEFAULT_SENDER.to_string(), Account::eoa("10.0", 5));
        accounts.insert(DEFAULT_RECIPIENT.to_string(), Account::eoa("5.0", 0));
        Self { accounts }
    }

    pub fn merged(&self, patch: &WorldStateOverride) -> Self {
        let mut out = self.clone();
        if let Some(accounts) = &patch.accounts {
            out.accounts = accounts.clone();
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldStateOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<BTreeMap<String, Account>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stack {
    pub items: Vec<String>,
}

impl Stack {
    pub fn top(&self) -> Option<&str> {
        self.items.last().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Memory {
    pub data: String,
    pub size: i64,
    pub preview: String,
}

impl Default for Memory {
    fn default() -> Self {
        Self { data: String::new(), size: 0, preview: "0x".to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Storage {
    pub slots: BTreeMap<String, String>,
}

// keccak256(rlp("")), the root of an empty trie.
pub fn empty_storage_root() -> String {
    let mut out = [0u8; 32];
    let mut hasher = Keccak::v256();
    hasher.update(&[0x80]);
    hasher.finalize(&mut out);
    format!("0x{}", hex::encode(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_root_matches_known_constant() {
        assert_eq!(
            empty_storage_root(),
            "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
        );
    }

    #[test]
    fn merge_replaces_accounts_wholesale() {
        let world = WorldState::seeded();
        let mut accounts = BTreeMap::new();
        accounts.insert("0xabc".to_string(), Account::eoa("1.0", 0));
        let merged = world.merged(&WorldStateOverride { accounts: Some(accounts) });
        assert_eq!(merged.accounts.len(), 1);
        assert!(merged.accounts.contains_key("0xabc"));

        let untouched = world.merged(&WorldStateOverride::default());
        assert_eq!(untouched, world);
    }

    #[test]
    fn zero_recipient_means_creation() {
        let mut tx = crate::catalog::simple_transfer().transaction;
        assert!(!tx.is_contract_creation());
        tx.to = CREATE_ADDRESS.to_string();
        assert!(tx.is_contract_creation());
    }

    #[test]
    fn seeded_accounts_are_eoas() {
        let world = WorldState::seeded();
        assert_eq!(world.accounts[DEFAULT_SENDER].nonce, 5);
        assert!(world.accounts.values().all(|a| !a.is_contract()));
    }
}
