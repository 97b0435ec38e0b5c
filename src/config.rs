use std::{env, num::ParseIntError, str::FromStr, time::Duration};

use thiserror::Error;

use crate::types::WorldState;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

const INTERVAL_ENV: &str = "EVM_VIZ_INTERVAL_MS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Slow,
    Normal,
    Fast,
}

impl Speed {
    pub fn interval(self) -> Duration {
        match self {
            Speed::Slow => Duration::from_millis(2000),
            Speed::Normal => Duration::from_millis(1000),
            Speed::Fast => Duration::from_millis(300),
        }
    }
}

impl FromStr for Speed {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slow" => Ok(Speed::Slow),
            "normal" => Ok(Speed::Normal),
            "fast" => Ok(Speed::Fast),
            _ => Err(ConfigError::UnknownSpeed(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub interval: Duration,
    pub initial_world: WorldState,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { interval: DEFAULT_INTERVAL, initial_world: WorldState::seeded() }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid integer in env var {name}: {source}")]
    InvalidInteger { name: String, source: ParseIntError },
    #[error("unknown speed '{0}' (expected slow, normal or fast)")]
    UnknownSpeed(String),
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Ok(raw) = env::var(INTERVAL_ENV) {
            let ms = raw
                .trim()
                .parse::<u64>()
                .map_err(|source| ConfigError::InvalidInteger {
                    name: INTERVAL_ENV.to_string(),
                    source,
                })?;
            cfg.interval = Duration::from_millis(ms);
        }
        Ok(cfg)
    }
}

// Tokio rejects a zero period.
pub fn normalize_interval(interval: Duration) -> Duration {
    interval.max(Duration::from_millis(1))
}
