//! Configuration Management
//!
//! Values come from `Config::default()`, overlaid with environment variables.
//! The binary applies its command line flags on top of that.
//!
//! ## Configuration Variables
//!
//! - `DATABASE_URL`: SQLite connection string (default: `sqlite:curator.db`)
//! - `BIND_ADDRESS`: HTTP server bind address (default: `0.0.0.0:3005`)
//! - `STATIC_DIR`: Directory served under `/static` (default: `./ui/static`)
//! - `DB_MAX_CONNECTIONS`: Size of the connection pool (default: `5`)
//! - `DB_ACQUIRE_TIMEOUT_SECS`: How long a request waits for a connection (default: `10`)
//! - `REQUEST_TIMEOUT_SECS`: Deadline for reading and answering one request (default: `10`)

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub static_dir: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:curator.db".to_string(),
            bind_address: "0.0.0.0:3005".to_string(),
            static_dir: "./ui/static".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 10,
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Defaults overlaid with whatever the process environment sets.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(addr) = lookup("BIND_ADDRESS") {
            config.bind_address = addr;
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            config.static_dir = dir;
        }
        if let Some(value) = lookup("DB_MAX_CONNECTIONS") {
            config.max_connections = parse_number("DB_MAX_CONNECTIONS", value)?;
        }
        if let Some(value) = lookup("DB_ACQUIRE_TIMEOUT_SECS") {
            config.acquire_timeout_secs = parse_number("DB_ACQUIRE_TIMEOUT_SECS", value)?;
        }
        if let Some(value) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number("REQUEST_TIMEOUT_SECS", value)?;
        }

        Ok(config)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Config for tests: a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }
}

fn parse_number<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    match value.trim().parse() {
        Ok(n) => Ok(n),
        Err(_) => Err(ConfigError::Invalid { name, value }),
    }
}
