//! Process settings from the environment (and an optional `.env`)

use std::time::Duration;

use maze_core::{BASE_STEP_DELAY_MS, DEFAULT_GENERATION_ATTEMPTS};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `MAZE_BIND_ADDR`, else `0.0.0.0:$PORT`, else `0.0.0.0:3001`
    pub bind_addr: String,
    /// `MAZE_BASE_DELAY_MS`: step delay at speed 1.0
    pub base_delay: Duration,
    /// `MAZE_GENERATION_ATTEMPTS`: candidates tried per generation request
    pub generation_attempts: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            base_delay: Duration::from_millis(BASE_STEP_DELAY_MS),
            generation_attempts: DEFAULT_GENERATION_ATTEMPTS,
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();

        if let Some(addr) = lookup("MAZE_BIND_ADDR") {
            settings.bind_addr = addr;
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: port.clone(),
                reason: "expected a port number",
            })?;
            settings.bind_addr = format!("0.0.0.0:{}", port);
        }

        if let Some(value) = lookup("MAZE_BASE_DELAY_MS") {
            let ms: u64 = value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "MAZE_BASE_DELAY_MS",
                value: value.clone(),
                reason: "expected milliseconds",
            })?;
            settings.base_delay = Duration::from_millis(ms);
        }

        if let Some(value) = lookup("MAZE_GENERATION_ATTEMPTS") {
            let attempts: usize = value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "MAZE_GENERATION_ATTEMPTS",
                value: value.clone(),
                reason: "expected a positive integer",
            })?;
            if attempts == 0 {
                return Err(ConfigError::Invalid {
                    key: "MAZE_GENERATION_ATTEMPTS",
                    value,
                    reason: "expected a positive integer",
                });
            }
            settings.generation_attempts = attempts;
        }

        Ok(settings)
    }
}
