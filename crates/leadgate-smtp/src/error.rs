//! Error types for SMTP operations.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Server rejected a command.
    #[error("SMTP error {code} after {command}: {message}")]
    Rejected {
        /// Command that was rejected (e.g. `RCPT TO`).
        command: &'static str,
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Protocol error (malformed or unexpected response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Feature not supported by server.
    #[error("Server does not support {0}")]
    NotSupported(&'static str),

    /// Envelope has no recipients.
    #[error("No recipients specified")]
    NoRecipients,
}

impl Error {
    /// Returns true if the server rejected the command permanently (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if the server rejected the command transiently (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 400 && *code < 500)
    }
}
