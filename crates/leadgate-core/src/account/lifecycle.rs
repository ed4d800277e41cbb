//! Account approval state machine and access gate.
//!
//! ```text
//!            approve
//!   Pending ─────────▶ Approved
//!      │                 ▲  │
//!      │ reject   approve│  │reject
//!      ▼                 │  ▼
//!   Rejected ◀───────────┴──┘
//! ```
//!
//! Approving an approved account and rejecting a rejected one are refused.
//! Every decision records its time and the deciding admin.

use chrono::{DateTime, Utc};

use super::model::{Account, AccountId, AccountStatus, Role};
use crate::Error;

/// Why an authenticated caller may not proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// Investor still awaiting review.
    PendingApproval,
    /// Investor was turned away.
    Rejected,
    /// Operation needs the admin role.
    AdminOnly,
}

impl AccessDenied {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::PendingApproval => "Your account is pending approval",
            Self::Rejected => "Your account has been rejected",
            Self::AdminOnly => "Administrator access required",
        }
    }
}

/// Approves an account.
///
/// # Errors
///
/// Returns [`Error::Conflict`] if the account is already approved.
pub fn approve(account: &mut Account, admin: AccountId, now: DateTime<Utc>) -> Result<(), Error> {
    if account.status == AccountStatus::Approved {
        return Err(Error::Conflict("User is already approved".into()));
    }
    account.status = AccountStatus::Approved;
    account.approved_at = Some(now);
    account.reviewed_by = Some(admin);
    Ok(())
}

/// Rejects an account.
///
/// # Errors
///
/// Returns [`Error::Conflict`] if the account is already rejected.
pub fn reject(account: &mut Account, admin: AccountId, now: DateTime<Utc>) -> Result<(), Error> {
    if account.status == AccountStatus::Rejected {
        return Err(Error::Conflict("User is already rejected".into()));
    }
    account.status = AccountStatus::Rejected;
    account.rejected_at = Some(now);
    account.reviewed_by = Some(admin);
    Ok(())
}

/// The status gate. Admins always pass; investors pass only when approved.
///
/// # Errors
///
/// Returns the reason a pending or rejected investor is refused.
pub const fn check_gate(role: Role, status: AccountStatus) -> Result<(), AccessDenied> {
    match (role, status) {
        (Role::Admin, _) | (Role::Investor, AccountStatus::Approved) => Ok(()),
        (Role::Investor, AccountStatus::Pending) => Err(AccessDenied::PendingApproval),
        (Role::Investor, AccountStatus::Rejected) => Err(AccessDenied::Rejected),
    }
}

/// Requires the admin role.
///
/// # Errors
///
/// Returns [`AccessDenied::AdminOnly`] for any other role.
pub const fn require_admin(role: Role) -> Result<(), AccessDenied> {
    match role {
        Role::Admin => Ok(()),
        Role::Investor => Err(AccessDenied::AdminOnly),
    }
}
