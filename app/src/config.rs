//! Process configuration, read once at start-up.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0} must be set when DECISION_ENGINE=remote")]
    Missing(&'static str),
}

/// Which decision engine the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// In-process CEDAR evaluation of a local policy file
    Local,
    /// Remote policy store over HTTP
    Remote,
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub policy_store_id: String,
    pub region: String,
    pub decision_endpoint: Option<String>,
    pub engine: EngineKind,
    pub decision_timeout: Duration,
    pub policy_path: Option<PathBuf>,
    pub port: u16,
    pub photo_base_url: String,
    pub user_id: String,
    pub account_id: String,
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let engine = match get("DECISION_ENGINE").as_deref() {
            None | Some("local") => EngineKind::Local,
            Some("remote") => EngineKind::Remote,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "DECISION_ENGINE",
                    value: other.to_string(),
                })
            }
        };

        let policy_store_id = get("POLICY_STORE_ID").unwrap_or_default();
        if engine == EngineKind::Remote && policy_store_id.is_empty() {
            return Err(ConfigError::Missing("POLICY_STORE_ID"));
        }

        let timeout_ms = parse(get("DECISION_TIMEOUT_MS"), "DECISION_TIMEOUT_MS", 2000u64)?;
        let port = parse(get("API_PORT"), "API_PORT", 3030u16)?;

        Ok(Self {
            policy_store_id,
            region: get("AWS_REGION").unwrap_or_else(|| "ap-northeast-1".to_string()),
            decision_endpoint: get("DECISION_ENDPOINT"),
            engine,
            decision_timeout: Duration::from_millis(timeout_ms),
            policy_path: get("POLICY_PATH").map(PathBuf::from),
            port,
            photo_base_url: get("PHOTO_BASE_URL").unwrap_or_else(|| "https://dummy.com".to_string()),
            user_id: get("PHOTOFLASH_USER_ID").unwrap_or_else(|| "test".to_string()),
            account_id: get("PHOTOFLASH_ACCOUNT_ID").unwrap_or_else(|| "test".to_string()),
            log_dir: get("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/logs")),
        })
    }
}

fn parse<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: v }),
    }
}
