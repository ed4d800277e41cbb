//! Signing and validating access tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::claims::{Claims, Subject};
use crate::error::{Error, Result};
use crate::token::{TokenPair, generate_refresh_token};

/// Minimum HMAC key length accepted for HS256.
const MIN_SECRET_LEN: usize = 32;

/// Token issuer configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// HMAC signing secret.
    pub secret: String,
    /// `iss` claim.
    pub issuer: String,
    /// `aud` claim.
    pub audience: String,
    /// Access token lifetime in minutes.
    pub expiration_minutes: i64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "leadgate".to_string(),
            audience: "leadgate-clients".to_string(),
            expiration_minutes: 60,
        }
    }
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_minutes", &self.expiration_minutes)
            .finish_non_exhaustive()
    }
}

impl TokenSettings {
    /// Creates settings with the given secret and default issuer, audience
    /// and lifetime.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Checks the settings are usable for signing.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is shorter than 32 bytes or the
    /// lifetime is not positive.
    pub fn validate(&self) -> Result<()> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(Error::InvalidConfig(format!(
                "JWT secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.expiration_minutes <= 0 {
            return Err(Error::InvalidConfig(
                "JWT expiration must be a positive number of minutes".into(),
            ));
        }
        Ok(())
    }
}

/// Issues and validates HS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    settings: TokenSettings,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.settings.issuer)
            .field("audience", &self.settings.audience)
            .field("expiration_minutes", &self.settings.expiration_minutes)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Creates an issuer from validated settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid.
    pub fn new(settings: TokenSettings) -> Result<Self> {
        settings.validate()?;
        let secret = settings.secret.as_bytes();
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            settings,
        })
    }

    /// Issues a fresh access/refresh token pair for the subject.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue(&self, subject: &Subject) -> Result<TokenPair> {
        self.issue_at(subject, Utc::now())
    }

    fn issue_at(&self, subject: &Subject, now: DateTime<Utc>) -> Result<TokenPair> {
        let expires_at = now + Duration::minutes(self.settings.expiration_minutes);
        let claims = Claims {
            sub: subject.id,
            email: subject.email.clone(),
            name: subject.name.clone(),
            role: subject.role.clone(),
            status: subject.status.clone(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
        };

        let access_token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
                .map_err(|e| Error::Signing(e.to_string()))?;
        debug!(subject = %subject.id, jti = %claims.jti, "Issued access token");

        Ok(TokenPair {
            access_token,
            refresh_token: generate_refresh_token(),
            expires_at,
            token_type: "Bearer".to_string(),
        })
    }

    /// Validates an access token presented on a request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Expired`] for an expired token and [`Error::Invalid`]
    /// for a bad signature, algorithm, issuer or audience.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        self.decode(token, true)
    }

    /// Validates an access token presented for refresh: everything but the
    /// lifetime is checked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalid`] for a bad signature, algorithm, issuer or
    /// audience.
    pub fn validate_for_refresh(&self, token: &str) -> Result<Claims> {
        self.decode(token, false)
    }

    fn decode(&self, token: &str, check_lifetime: bool) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_audience(&[&self.settings.audience]);
        validation.validate_exp = check_lifetime;
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}
