//! # leadgate-auth
//!
//! Token issuance for the leadgate API.
//!
//! ## Features
//!
//! - **Access tokens**: short-lived HS256 JWTs carrying subject id, email,
//!   display name, role, approval status and a unique token id
//! - **Refresh tokens**: opaque random strings returned alongside each access
//!   token
//! - **Validation**: signature, issuer, audience and lifetime checks, with a
//!   lifetime-agnostic variant used when refreshing
//!
//! ## Quick Start
//!
//! ```ignore
//! use leadgate_auth::{Subject, TokenIssuer, TokenSettings};
//!
//! let issuer = TokenIssuer::new(TokenSettings::new("a-secret-of-at-least-thirty-two-bytes"))?;
//! let pair = issuer.issue(&Subject {
//!     id: account_id,
//!     email: "investor@example.com".into(),
//!     name: "Ada Investor".into(),
//!     role: "investor".into(),
//!     status: "approved".into(),
//! })?;
//!
//! let claims = issuer.validate(&pair.access_token)?;
//! assert_eq!(claims.sub, account_id);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod claims;
mod error;
mod issuer;
pub mod token;

pub use claims::{Claims, Subject};
pub use error::{Error, Result};
pub use issuer::{TokenIssuer, TokenSettings};
pub use token::TokenPair;
