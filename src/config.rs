//! Console configuration parsing and validation.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

fn default_server_url() -> String {
    "http://127.0.0.1:8000/api".into()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    2000
}

/// Console configuration parsed from `sqlscope.toml`.
///
/// Every field has a default, so the console runs without a config file
/// against a locally hosted service.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct ConsoleConfig {
    /// Base URL of the check service API.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Per-request timeout for plain request/response calls.  Does not
    /// apply to the streaming check body.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Fixed batch progress polling interval.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Model used when a command does not specify `--model-id`.
    pub default_model_id: Option<i64>,
    /// ERP configuration used when a command does not specify
    /// `--erp-config-id`.
    pub default_erp_config_id: Option<i64>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            request_timeout_seconds: default_request_timeout_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
            default_model_id: None,
            default_erp_config_id: None,
        }
    }
}

impl ConsoleConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` on malformed TOML or a zero polling
    /// interval.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, or defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the file cannot be read or fails
    /// to parse.  A missing *explicit* path is an error; no path at all
    /// is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|err| {
                    AppError::Config(format!("cannot read {}: {err}", path.display()))
                })?;
                Self::from_toml_str(&text)
            }
        }
    }

    /// Polling interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(AppError::Config("server_url must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(AppError::Config("poll_interval_ms must be positive".into()));
        }
        Ok(())
    }
}
