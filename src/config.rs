//! Client configuration.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults (local backend on port 8003)
//! 2. A TOML file (`scorecard-chat.toml` in the working directory, or an explicit path)
//! 3. Environment variables `WEBSOCKET_URL`, `API_BASE_URL`, `SCORECARD_TIMEOUT_SECS`,
//!    after loading `.env` if one exists
//! 4. Command-line overrides applied by the caller

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_WS_URL: &str = "ws://localhost:8003/api/v1/scorecard/chat";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8003/api/v1/scorecard";
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

pub const CONFIG_FILE_NAME: &str = "scorecard-chat.toml";

pub const ENV_WS_URL: &str = "WEBSOCKET_URL";
pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "SCORECARD_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint for message exchanges.
    pub ws_url: String,
    /// Base URL of the REST API; history lives at `{api_base_url}/history/{id}`.
    pub api_base_url: String,
    /// Bound on the WebSocket connect and on each read.
    pub exchange_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            ws_url: DEFAULT_WS_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }
}

/// On-disk shape. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    ws_url: Option<String>,
    api_base_url: Option<String>,
    exchange_timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Load from `.env`, the config file, and the process environment.
    ///
    /// `path` selects the config file; when `None`, `scorecard-chat.toml` in
    /// the working directory is used if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(e) = dotenv_problem(dotenvy::dotenv()) {
            warn!(error = %e, "ignoring unreadable .env file");
        }

        let mut config = ClientConfig::default();
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Some(PathBuf::from(CONFIG_FILE_NAME)).filter(|p| p.exists()),
        };
        if let Some(file) = file {
            config.apply_file(&file)?;
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Merge values from a TOML file.
    pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        if let Some(url) = file.ws_url {
            self.ws_url = url;
        }
        if let Some(url) = file.api_base_url {
            self.api_base_url = url;
        }
        if let Some(secs) = file.exchange_timeout_secs {
            self.exchange_timeout = Duration::from_secs(secs);
        }
        Ok(())
    }

    /// Merge values from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_WS_URL) {
            self.ws_url = url;
        }
        if let Some(url) = get(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_TIMEOUT_SECS.to_string(),
                reason: format!("expected whole seconds, got '{}'", secs),
            })?;
            self.exchange_timeout = Duration::from_secs(secs);
        }
        Ok(())
    }

    /// Check URL schemes and the timeout, and normalize the API base.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        check_url("ws_url", &self.ws_url, &["ws", "wss"])?;
        check_url("api_base_url", &self.api_base_url, &["http", "https"])?;
        if self.exchange_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "exchange_timeout".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        while self.api_base_url.ends_with('/') {
            self.api_base_url.pop();
        }
        Ok(())
    }
}

/// A `.env` failure worth reporting. A missing file is not one.
fn dotenv_problem<T>(result: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    match result {
        Err(e) if !e.not_found() => Some(e),
        _ => None,
    }
}

fn check_url(field: &str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        reason: format!("'{}' is not a URL: {}", value, e),
    })?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("scheme must be one of {:?}, got '{}'", schemes, url.scheme()),
        });
    }
    Ok(())
}
