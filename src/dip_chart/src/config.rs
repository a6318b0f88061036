//! Client configuration: parsing, environment overrides and validation.
//!
//! A config file is a flat TOML table; every key is optional:
//!
//! ```toml
//! api_base_url = "http://127.0.0.1:8000"
//! request_timeout_ms = 8000
//! refresh_timeout_ms = 120000
//! max_bars = 500
//! ```
//!
//! Entrypoints:
//! - Parse + validate from a TOML string: [`load_config_str`]
//! - Parse + validate from a file path: [`load_config_path`]
//! - Defaults overlaid with `DIP_*` variables: [`ClientConfig::from_env`]

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use shared_utils::env::{get_env_var_opt, parse_env_var};
use tracing::debug;

use crate::{
    errors::{Error, Result},
    providers::dip_api::params::ws_base_url,
    store::MAX_BARS,
};

pub const ENV_API_BASE_URL: &str = "DIP_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "DIP_REQUEST_TIMEOUT_MS";
pub const ENV_REFRESH_TIMEOUT_MS: &str = "DIP_REFRESH_TIMEOUT_MS";
pub const ENV_MAX_BARS: &str = "DIP_MAX_BARS";

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Where the backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// REST base URL; the WebSocket base is derived from it.
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    /// Timeout for `POST /refresh`, which blocks while the backend re-ingests.
    pub refresh_timeout_ms: u64,
    /// Capacity of the session's bar store.
    pub max_bars: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: 8_000,
            refresh_timeout_ms: 120_000,
            max_bars: MAX_BARS,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with any `DIP_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Overwrites fields whose `DIP_*` variable is set and non-blank.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(url) = get_env_var_opt(ENV_API_BASE_URL) {
            debug!(%url, "api base url from environment");
            self.api_base_url = url;
        }
        if let Some(ms) = parse_env_var::<u64>(ENV_REQUEST_TIMEOUT_MS)? {
            self.request_timeout_ms = ms;
        }
        if let Some(ms) = parse_env_var::<u64>(ENV_REFRESH_TIMEOUT_MS)? {
            self.refresh_timeout_ms = ms;
        }
        if let Some(n) = parse_env_var::<usize>(ENV_MAX_BARS)? {
            self.max_bars = n;
        }
        Ok(())
    }

    /// Checks the URL scheme and non-zero limits, and trims a trailing `/`
    /// from the base URL.
    ///
    /// Errors:
    /// - base URL not `http://` or `https://`
    /// - a zero timeout or a zero `max_bars`
    pub fn validate(&mut self) -> Result<()> {
        let url = self.api_base_url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api_base_url must start with http:// or https://, got {:?}",
                self.api_base_url
            )));
        }
        self.api_base_url = url.to_string();

        if self.request_timeout_ms == 0 || self.refresh_timeout_ms == 0 {
            return Err(Error::Config("timeouts must be greater than zero".into()));
        }
        if self.max_bars == 0 {
            return Err(Error::Config("max_bars must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }

    /// `ws://` or `wss://` counterpart of [`api_base_url`](Self::api_base_url).
    pub fn ws_base_url(&self) -> String {
        ws_base_url(&self.api_base_url)
    }
}

/// Parse and validate a config from a TOML string. Environment variables are
/// not consulted.
pub fn load_config_str(toml_str: &str) -> Result<ClientConfig> {
    let mut config: ClientConfig = toml::from_str(toml_str)?;
    config.validate()?;
    Ok(config)
}

/// Read a config file from disk, apply `DIP_*` overrides, then validate.
pub fn load_config_path(path: impl AsRef<Path>) -> Result<ClientConfig> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let mut config: ClientConfig = toml::from_str(&text)?;
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}
