//! Server and matchmaking configuration
//!
//! Values are layered, later layers winning:
//!
//! 1. built-in defaults
//! 2. a JSON file named by `CHESS_MATCH_CONFIG`
//! 3. individual environment overrides (`.env` files are honoured)
//!
//! | Variable                    | Field                        | Example        |
//! |-----------------------------|------------------------------|----------------|
//! | `CHESS_MATCH_BIND_ADDR`     | `bind_addr`                  | `0.0.0.0:3001` |
//! | `CHESS_MATCH_THRESHOLD`     | `matching.match_threshold`   | `200`          |
//! | `CHESS_MATCH_GRACE_PERIOD`  | `matching.grace_period_secs` | `5s`, `1m`     |
//! | `CHESS_MATCH_CODE_LENGTH`   | `matching.room_code_length`  | `8`            |
//!
//! The merged result is validated once all layers are applied.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{CoreError, CoreResult};

pub const CONFIG_PATH_VAR: &str = "CHESS_MATCH_CONFIG";
pub const BIND_ADDR_VAR: &str = "CHESS_MATCH_BIND_ADDR";
pub const THRESHOLD_VAR: &str = "CHESS_MATCH_THRESHOLD";
pub const GRACE_PERIOD_VAR: &str = "CHESS_MATCH_GRACE_PERIOD";
pub const CODE_LENGTH_VAR: &str = "CHESS_MATCH_CODE_LENGTH";

/// Shortest session code accepted from configuration.
pub const MIN_CODE_LENGTH: usize = 4;

/// Tunables of the match registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Largest skill-proxy difference two queued players may have and still be paired
    pub match_threshold: u32,
    /// How long a finished session lingers before it is discarded
    pub grace_period_secs: u64,
    /// Length of generated session codes
    pub room_code_length: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            match_threshold: 200,
            grace_period_secs: 5,
            room_code_length: 8,
        }
    }
}

impl MatchConfig {
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

/// Settings of the backend process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Period of the expired-session sweep
    pub sweep_interval_ms: u64,
    pub matching: MatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            sweep_interval_ms: 1000,
            matching: MatchConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads from the process environment, reading `.env` first if present.
    pub fn load() -> CoreResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("[CONFIG] Loaded environment from {:?}", path);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads using `lookup` in place of the environment.
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::read_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(addr) = parse_var(&lookup, BIND_ADDR_VAR)? {
            config.bind_addr = addr;
        }
        if let Some(threshold) = parse_var(&lookup, THRESHOLD_VAR)? {
            config.matching.match_threshold = threshold;
        }
        if let Some(raw) = lookup(GRACE_PERIOD_VAR) {
            let invalid = || CoreError::InvalidValue {
                key: GRACE_PERIOD_VAR.to_string(),
                value: raw.clone(),
            };
            let grace = humantime::parse_duration(raw.trim()).map_err(|_| invalid())?;
            // Stored in whole seconds
            if grace.subsec_nanos() != 0 {
                return Err(invalid());
            }
            config.matching.grace_period_secs = grace.as_secs();
        }
        if let Some(length) = parse_var(&lookup, CODE_LENGTH_VAR)? {
            config.matching.room_code_length = length;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> CoreResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        info!("[CONFIG] Loaded config from {:?}", path);
        Ok(config)
    }

    /// Rejects values the server cannot run with, whichever layer set them.
    pub fn validate(&self) -> CoreResult<()> {
        if self.matching.room_code_length < MIN_CODE_LENGTH {
            return Err(CoreError::InvalidValue {
                key: "matching.room_code_length".to_string(),
                value: self.matching.room_code_length.to_string(),
            });
        }
        if self.sweep_interval_ms == 0 {
            return Err(CoreError::InvalidValue {
                key: "sweep_interval_ms".to_string(),
                value: self.sweep_interval_ms.to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> CoreResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CoreError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}
