//! Error types for API fetching.

use thiserror::Error;

/// Failures raised by the exhibitions API client.
///
/// All of these are fatal to a run; nothing upstream retries them.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("exhibitions request failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error("exhibitions response is missing the `data` array")]
    MissingData,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
