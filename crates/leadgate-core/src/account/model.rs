//! Account model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::page::{default_page, default_page_size};

/// Unique identifier for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an account may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Self-registered investor; subject to approval.
    #[default]
    Investor,
    /// Administrator; reviews accounts and manages leads.
    Admin,
}

impl Role {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "investor" => Some(Self::Investor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Investor => "investor",
            Self::Admin => "admin",
        }
    }
}

/// Approval state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Awaiting admin review.
    #[default]
    Pending,
    /// Admitted.
    Approved,
    /// Turned away.
    Rejected,
}

impl AccountStatus {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Login email, stored lowercased.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Optional organization.
    pub organization: Option<String>,
    /// Role.
    pub role: Role,
    /// Approval state.
    pub status: AccountStatus,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Set by the most recent approval.
    pub approved_at: Option<DateTime<Utc>>,
    /// Set by the most recent rejection.
    pub rejected_at: Option<DateTime<Utc>>,
    /// Admin who made the most recent decision.
    pub reviewed_by: Option<AccountId>,
}

impl Account {
    /// A freshly registered investor awaiting approval.
    #[must_use]
    pub fn investor(
        email: &str,
        full_name: &str,
        organization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::generate(),
            email: normalize_email(email),
            full_name: full_name.trim().to_string(),
            organization: organization
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string),
            role: Role::Investor,
            status: AccountStatus::Pending,
            created_at: now,
            approved_at: None,
            rejected_at: None,
            reviewed_by: None,
        }
    }

    /// An administrator. Admins are approved on creation.
    #[must_use]
    pub fn admin(email: &str, full_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            role: Role::Admin,
            status: AccountStatus::Approved,
            approved_at: Some(now),
            ..Self::investor(email, full_name, None, now)
        }
    }

    /// Returns true for administrators.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Canonical form of a login email.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// An investor self-registration request.
///
/// Absent fields deserialize empty and are reported by validation.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Registration {
    /// Login email.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Must equal `password`.
    pub confirm_password: String,
    /// Display name.
    pub full_name: String,
    /// Optional organization.
    pub organization: Option<String>,
    /// Self-declared accredited investor status; must be true.
    pub accredited_investor_attestation: bool,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("organization", &self.organization)
            .field(
                "accredited_investor_attestation",
                &self.accredited_investor_attestation,
            )
            .finish_non_exhaustive()
    }
}

/// Changes a user may make to their own profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// Replaces the name unless absent or blank.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Replaces the organization when present; an empty string clears it.
    #[serde(default)]
    pub organization: Option<String>,
}

impl ProfileUpdate {
    /// Applies the update to an account.
    pub fn apply(self, account: &mut Account) {
        if let Some(name) = self.full_name.filter(|n| !n.trim().is_empty()) {
            account.full_name = name.trim().to_string();
        }
        if let Some(organization) = self.organization {
            let organization = organization.trim();
            account.organization = (!organization.is_empty()).then(|| organization.to_string());
        }
    }
}

/// Account listing filter and paging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFilter {
    /// Only accounts in this state.
    #[serde(default)]
    pub status: Option<AccountStatus>,
    /// Only accounts with this role.
    #[serde(default)]
    pub role: Option<Role>,
    /// Case-insensitive substring of email, name or organization.
    #[serde(default)]
    pub search: Option<String>,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for AccountFilter {
    fn default() -> Self {
        Self {
            status: None,
            role: None,
            search: None,
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn investor_starts_pending_with_normalized_email() {
        let now = Utc::now();
        let account = Account::investor(" Ada@Example.COM ", " Ada ", Some("  "), now);
        assert_eq!(account.email, "ada@example.com");
        assert_eq!(account.full_name, "Ada");
        assert_eq!(account.organization, None);
        assert_eq!(account.role, Role::Investor);
        assert_eq!(account.status, AccountStatus::Pending);
        assert_eq!(account.approved_at, None);
        assert!(!account.is_admin());
    }

    #[test]
    fn partial_registration_deserializes_empty() {
        let registration: Registration =
            serde_json::from_str(r#"{"email":"ada@example.com","password":"secret-pass"}"#)
                .unwrap();
        assert_eq!(registration.email, "ada@example.com");
        assert!(registration.confirm_password.is_empty());
        assert!(registration.full_name.is_empty());
        assert!(!registration.accredited_investor_attestation);
    }

    #[test]
    fn admin_is_approved() {
        let now = Utc::now();
        let admin = Account::admin("root@example.com", "Root", now);
        assert!(admin.is_admin());
        assert_eq!(admin.status, AccountStatus::Approved);
        assert_eq!(admin.approved_at, Some(now));
    }

    #[test]
    fn profile_update_rules() {
        let mut account = Account::investor("a@example.com", "Ada", Some("Fund"), Utc::now());

        ProfileUpdate {
            full_name: Some("   ".into()),
            organization: None,
        }
        .apply(&mut account);
        assert_eq!(account.full_name, "Ada");
        assert_eq!(account.organization.as_deref(), Some("Fund"));

        ProfileUpdate {
            full_name: Some("Ada L.".into()),
            organization: Some(String::new()),
        }
        .apply(&mut account);
        assert_eq!(account.full_name, "Ada L.");
        assert_eq!(account.organization, None);
    }

    #[test]
    fn registration_debug_hides_password() {
        let registration: Registration = serde_json::from_str(
            r#"{"email":"a@b.co","password":"hunter2hunter2","confirmPassword":"hunter2hunter2","fullName":"A"}"#,
        )
        .unwrap();
        assert!(!registration.accredited_investor_attestation);
        assert!(!format!("{registration:?}").contains("hunter2"));
    }

    #[test]
    fn status_strings() {
        for status in [
            AccountStatus::Pending,
            AccountStatus::Approved,
            AccountStatus::Rejected,
        ] {
            assert_eq!(AccountStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(serde_json::to_value(Role::Investor).unwrap(), "investor");
    }
}
