//! Error types for the core library.

use thiserror::Error;

use crate::account::{AccessDenied, AccountId, AuthFailure};
use crate::lead::LeadId;
use crate::validation::ValidationErrors;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Request failed validation; nothing was changed.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Request conflicts with existing state.
    #[error("{0}")]
    Conflict(String),

    /// Lead not found.
    #[error("Lead not found: {0}")]
    LeadNotFound(LeadId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Credentials were rejected or the account is locked.
    #[error("{}", .0.message())]
    Unauthorized(AuthFailure),

    /// Caller is authenticated but not allowed to proceed.
    #[error("{}", .0.message())]
    Forbidden(AccessDenied),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed.
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// A stored value could not be decoded.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<AuthFailure> for Error {
    fn from(failure: AuthFailure) -> Self {
        Self::Unauthorized(failure)
    }
}

impl From<AccessDenied> for Error {
    fn from(denied: AccessDenied) -> Self {
        Self::Forbidden(denied)
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
