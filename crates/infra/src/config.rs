//! Process configuration loaded from the environment.

use std::net::SocketAddr;

use opsdeck_observability::LogFormat;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SCORE_ALL_CONCURRENCY: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: `{value}` ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Engine/runtime configuration.
///
/// | variable | default |
/// |---|---|
/// | `BIND_ADDR` | `0.0.0.0:8080` |
/// | `USE_PERSISTENT_STORES` | `false` |
/// | `DATABASE_URL` | required when persistent |
/// | `SCORE_ALL_CONCURRENCY` | `8` (min 1) |
/// | `LOG_FORMAT` | `json` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub bind_addr: SocketAddr,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub score_all_concurrency: usize,
    pub log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            use_persistent_stores: false,
            database_url: None,
            score_all_concurrency: DEFAULT_SCORE_ALL_CONCURRENCY,
            log_format: LogFormat::Json,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup("BIND_ADDR") {
            cfg.bind_addr = raw
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::invalid("BIND_ADDR", &raw, e.to_string()))?;
        }

        if let Some(raw) = lookup("USE_PERSISTENT_STORES") {
            cfg.use_persistent_stores = parse_bool(&raw)
                .ok_or_else(|| ConfigError::invalid("USE_PERSISTENT_STORES", &raw, "expected true or false"))?;
        }

        cfg.database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if cfg.use_persistent_stores && cfg.database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        if let Some(raw) = lookup("SCORE_ALL_CONCURRENCY") {
            let n: usize = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("SCORE_ALL_CONCURRENCY", &raw, "expected a positive integer"))?;
            if n == 0 {
                return Err(ConfigError::invalid("SCORE_ALL_CONCURRENCY", &raw, "must be at least 1"));
            }
            cfg.score_all_concurrency = n;
        }

        if let Some(raw) = lookup("LOG_FORMAT") {
            cfg.log_format = raw
                .parse()
                .map_err(|e: opsdeck_observability::ParseLogFormatError| {
                    ConfigError::invalid("LOG_FORMAT", &raw, e.to_string())
                })?;
        }

        Ok(cfg)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
