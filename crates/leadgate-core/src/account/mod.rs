//! Investor account management.
//!
//! Provides account models, password credentials with lockout, the
//! approval state machine and storage.

pub mod credentials;
pub mod lifecycle;
mod model;
mod repository;

pub use credentials::{AuthFailure, StoredCredential, Verification};
pub use lifecycle::AccessDenied;
pub use model::{
    Account, AccountFilter, AccountId, AccountStatus, ProfileUpdate, Registration, Role,
};
pub use repository::AccountRepository;
