pub mod types;
pub mod scenario;
pub mod catalog;
pub mod derive;
pub mod machine;
pub mod engine;
pub mod config;
pub mod loader;
pub mod keys;
pub mod opcodes;
pub mod disasm;
pub mod gas;

pub use catalog::{export_json, import_json, ScenarioError, ScenarioStore};
pub use config::{EngineConfig, Speed};
pub use derive::{derive_state, LegacyWorldStateRule, Snapshot};
pub use engine::Engine;
pub use machine::{ExecutionState, Simulation};
pub use scenario::{Scenario, Step};
pub use types::{Account, Memory, Stack, Storage, Transaction, WorldState};
