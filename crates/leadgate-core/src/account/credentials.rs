//! Password credentials and login lockout.
//!
//! Passwords are stored as Argon2id PHC strings. After
//! [`MAX_FAILED_LOGINS`] consecutive failures an account is locked for
//! [`LOCKOUT_MINUTES`]; a successful login clears the counter.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tracing::debug;

use crate::{Error, Result};

/// Consecutive failures that trigger a lockout.
pub const MAX_FAILED_LOGINS: u32 = 5;

/// Lockout duration.
pub const LOCKOUT_MINUTES: i64 = 5;

/// Why a login attempt was refused before any status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Unknown email or wrong password.
    InvalidCredentials,
    /// Too many recent failures.
    LockedOut,
    /// Missing, expired or otherwise unusable token.
    InvalidToken,
}

impl AuthFailure {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Invalid email or password",
            Self::LockedOut => "Account is locked. Please try again later.",
            Self::InvalidToken => "Invalid or expired token",
        }
    }
}

/// Hashes a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| Error::PasswordHash(e.to_string()))?;

    let hash = hasher()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Argon2id with the recommended parameters; unit tests use a cheap
/// configuration. Verification always uses the parameters in the hash.
fn hasher() -> Argon2<'static> {
    let params = if cfg!(test) {
        Params::new(1024, 1, 1, None).unwrap_or_default()
    } else {
        Params::default()
    };
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// Checks a password against a stored hash. Malformed hashes never match.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

/// Credential state stored alongside an account.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCredential {
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Consecutive failures since the last success or lockout.
    pub failed_logins: u32,
    /// Locked until this instant, if set and in the future.
    pub lockout_until: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredential")
            .field("failed_logins", &self.failed_logins)
            .field("lockout_until", &self.lockout_until)
            .finish_non_exhaustive()
    }
}

/// Outcome of checking a password against a [`StoredCredential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Password matched.
    Success,
    /// Password did not match. Carries the counter state to persist.
    Failure {
        /// New consecutive failure count.
        failed_logins: u32,
        /// Set when this failure triggered a lockout.
        lockout_until: Option<DateTime<Utc>>,
    },
    /// Locked; the password was not checked.
    Locked,
}

impl StoredCredential {
    /// Creates a fresh credential for a password hash.
    #[must_use]
    pub const fn new(password_hash: String) -> Self {
        Self {
            password_hash,
            failed_logins: 0,
            lockout_until: None,
        }
    }

    /// Returns true while a lockout is in force.
    #[must_use]
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lockout_until.is_some_and(|until| until > now)
    }

    /// Returns true if a success must clear stored failure state.
    #[must_use]
    pub const fn needs_reset(&self) -> bool {
        self.failed_logins > 0 || self.lockout_until.is_some()
    }

    /// Checks a password attempt at `now`.
    #[must_use]
    pub fn check(&self, password: &str, now: DateTime<Utc>) -> Verification {
        if self.is_locked(now) {
            return Verification::Locked;
        }
        if verify_password(password, &self.password_hash) {
            return Verification::Success;
        }

        let failed = self.failed_logins.saturating_add(1);
        if failed >= MAX_FAILED_LOGINS {
            debug!(failed, "Failure limit reached; locking");
            Verification::Failure {
                failed_logins: 0,
                lockout_until: Some(now + Duration::minutes(LOCKOUT_MINUTES)),
            }
        } else {
            Verification::Failure {
                failed_logins: failed,
                lockout_until: None,
            }
        }
    }
}
