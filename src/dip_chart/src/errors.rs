use shared_utils::env::InvalidEnvVarError;
use thiserror::Error;

use crate::providers::ProviderError;

/// The unified error type for the `dip_chart` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error originating from the backend client (transport, status, timeout, payload).
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// An error related to configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`ClientConfig`](crate::config::ClientConfig).
    #[error("Failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    InvalidEnv(#[from] InvalidEnvVarError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
