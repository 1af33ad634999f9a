use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum JournalError {
    /// Required input missing or unusable; nothing reached the store.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An account prerequisite is missing, e.g. no initial balance saved.
    #[error("Account not configured: {0}")]
    Configuration(String),

    /// The target record vanished between load and mutate; the caller
    /// should drop its stale copy.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend call failed; the underlying reason is surfaced verbatim.
    #[error("Backend store error: {0}")]
    Store(#[from] ApiError),
}
