//! Error types for token operations.

use jsonwebtoken::errors::ErrorKind;

/// Result type alias for token operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Token error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Token lifetime has passed.
    #[error("Token expired")]
    Expired,

    /// Token is malformed, badly signed, or issued for someone else.
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Token could not be signed.
    #[error("Failed to sign token: {0}")]
    Signing(String),

    /// Invalid issuer configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid(err.to_string()),
        }
    }
}
