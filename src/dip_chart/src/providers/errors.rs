use std::time::Duration;

use thiserror::Error;

/// Errors that can occur within a `HistoryProvider` implementation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure (connection refused, reset, DNS, ...).
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The request did not complete within its timeout and was aborted.
    #[error("Request timed out")]
    Timeout { timeout: Duration },

    /// The backend answered with a non-success status.
    #[error("Request failed ({status})")]
    Status { status: u16 },

    /// The response body was not the expected JSON shape.
    #[error("Malformed payload: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Maps a reqwest error, folding its timeout case into [`ProviderError::Timeout`].
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout { timeout }
        } else if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Request(err)
        }
    }
}
