//! Store client errors.

use thiserror::Error;

/// Errors raised by a `Base` implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Project key is not of the form `<project id>_<secret>`
    #[error("Invalid Deta project key")]
    InvalidProjectKey,

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    /// Insert hit an existing key
    #[error("Item with key {0} already exists")]
    KeyExists(String),

    /// Non-success response from the store
    #[error("Deta Base returned {status}: {}", .errors.join(", "))]
    Api { status: u16, errors: Vec<String> },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid document: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type StoreResult<T> = Result<T, StoreError>;
