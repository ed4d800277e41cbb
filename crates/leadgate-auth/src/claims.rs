//! Access token claims.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The account a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Account identifier.
    pub id: Uuid,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role (`investor` or `admin`).
    pub role: String,
    /// Approval status at issue time (`pending`, `approved`, `rejected`).
    pub status: String,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id).
    pub sub: Uuid,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role.
    pub role: String,
    /// Approval status at issue time.
    pub status: String,
    /// Unique token id.
    pub jti: Uuid,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
}

impl Claims {
    /// Returns true if the role claim is `admin`.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}
