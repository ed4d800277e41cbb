//! Investor account lifecycle.

use tracing::{info, warn};

use crate::account::credentials::{self, AuthFailure, StoredCredential, Verification};
use crate::account::lifecycle::{self, check_gate};
use crate::account::{
    Account, AccountFilter, AccountId, AccountRepository, AccountStatus, ProfileUpdate,
    Registration,
};
use crate::db;
use crate::page::{self, Page};
use crate::validation::{ValidationError, validate_profile_update, validate_registration};
use crate::{Error, Result};

/// Acknowledgement returned after registration.
pub const REGISTERED: &str = "Registration successful. Your account is pending approval.";

/// Registration, login and the admin review workflow.
#[derive(Debug, Clone)]
pub struct AccountService {
    repo: AccountRepository,
}

impl AccountService {
    /// Creates the service.
    #[must_use]
    pub const fn new(repo: AccountRepository) -> Self {
        Self { repo }
    }

    /// Registers a new investor in the pending state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a bad request and [`Error::Conflict`]
    /// if the email is already registered.
    pub async fn register(&self, registration: Registration) -> Result<Account> {
        validate_registration(&registration)?;

        if self.repo.find_by_email(&registration.email).await?.is_some() {
            return Err(Error::Conflict(
                "An account with this email already exists".into(),
            ));
        }

        let credential = StoredCredential::new(credentials::hash_password(&registration.password)?);
        let account = Account::investor(
            &registration.email,
            &registration.full_name,
            registration.organization.as_deref(),
            db::now(),
        );
        self.repo.create(&account, &credential).await?;

        info!(account = %account.id, email = %account.email, "New investor registered");
        Ok(account)
    }

    /// Verifies credentials and applies the status gate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] for bad credentials or a locked
    /// account, and [`Error::Forbidden`] for a pending or rejected investor.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account> {
        let Some((account, credential)) = self.repo.find_credentials(email).await? else {
            info!("Login failed: unknown email");
            return Err(AuthFailure::InvalidCredentials.into());
        };

        match credential.check(password, db::now()) {
            Verification::Locked => {
                warn!(account = %account.id, "Login refused: account locked");
                return Err(AuthFailure::LockedOut.into());
            }
            Verification::Failure {
                failed_logins,
                lockout_until,
            } => {
                self.repo
                    .record_login_failure(account.id, failed_logins, lockout_until)
                    .await?;
                if lockout_until.is_some() {
                    warn!(account = %account.id, "Account locked after repeated failures");
                    return Err(AuthFailure::LockedOut.into());
                }
                info!(account = %account.id, failed_logins, "Login failed: wrong password");
                return Err(AuthFailure::InvalidCredentials.into());
            }
            Verification::Success => {
                if credential.needs_reset() {
                    self.repo.reset_login_failures(account.id).await?;
                }
            }
        }

        check_gate(account.role, account.status)?;
        info!(account = %account.id, email = %account.email, "User logged in");
        Ok(account)
    }

    /// Reloads the account named by a refreshed token's subject.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if the account no longer exists and
    /// [`Error::Forbidden`] if it no longer passes the status gate.
    pub async fn refresh(&self, id: AccountId) -> Result<Account> {
        let account = self
            .repo
            .get(id)
            .await?
            .ok_or(Error::Unauthorized(AuthFailure::InvalidToken))?;
        check_gate(account.role, account.status)?;
        Ok(account)
    }

    /// The caller's own account, subject to the status gate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] or [`Error::Forbidden`].
    pub async fn current(&self, id: AccountId) -> Result<Account> {
        let account = self.get(id).await?;
        check_gate(account.role, account.status)?;
        Ok(account)
    }

    /// Updates the caller's own profile, subject to the status gate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`], [`Error::AccountNotFound`] or
    /// [`Error::Forbidden`].
    pub async fn update_current(&self, id: AccountId, update: ProfileUpdate) -> Result<Account> {
        validate_profile_update(&update)?;
        let mut account = self.current(id).await?;
        update.apply(&mut account);
        self.persist(&account).await?;
        info!(account = %id, "Profile updated");
        Ok(account)
    }

    /// Approves an account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] or [`Error::Conflict`] if the
    /// account is already approved.
    pub async fn approve(&self, id: AccountId, admin: AccountId) -> Result<Account> {
        let mut account = self.get(id).await?;
        lifecycle::approve(&mut account, admin, db::now())?;
        self.persist(&account).await?;
        info!(account = %id, admin = %admin, "Account approved");
        Ok(account)
    }

    /// Rejects an account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] or [`Error::Conflict`] if the
    /// account is already rejected.
    pub async fn reject(&self, id: AccountId, admin: AccountId) -> Result<Account> {
        let mut account = self.get(id).await?;
        lifecycle::reject(&mut account, admin, db::now())?;
        self.persist(&account).await?;
        info!(account = %id, admin = %admin, "Account rejected");
        Ok(account)
    }

    /// Number of accounts awaiting review.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn pending_count(&self) -> Result<u64> {
        self.repo.count_by_status(AccountStatus::Pending).await
    }

    /// Lists accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a zero page or page size, or a
    /// database error.
    pub async fn list(&self, mut filter: AccountFilter) -> Result<Page<Account>> {
        let (page, page_size) = page::normalize(filter.page, filter.page_size)?;
        filter.page = page;
        filter.page_size = page_size;
        self.repo.list(&filter).await
    }

    /// Creates an approved admin unless an account with `email` exists.
    ///
    /// Returns `true` if an account was created.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a malformed email or short password,
    /// or a database error.
    pub async fn ensure_admin(&self, email: &str, password: &str, full_name: &str) -> Result<bool> {
        if let Some(existing) = self.repo.find_by_email(email).await? {
            if !existing.is_admin() {
                warn!(
                    account = %existing.id,
                    "Bootstrap admin email belongs to a non-admin account"
                );
            }
            return Ok(false);
        }

        let mut errors = Vec::new();
        if !crate::validation::is_valid_email(email) {
            errors.push(ValidationError::InvalidEmail);
        }
        if password.chars().count() < crate::validation::MIN_PASSWORD_LEN {
            errors.push(ValidationError::TooShort {
                field: "password",
                min: crate::validation::MIN_PASSWORD_LEN,
            });
        }
        if !errors.is_empty() {
            return Err(crate::ValidationErrors(errors).into());
        }

        let name = if full_name.trim().is_empty() {
            "Administrator"
        } else {
            full_name
        };
        let account = Account::admin(email, name, db::now());
        let credential = StoredCredential::new(credentials::hash_password(password)?);
        self.repo.create(&account, &credential).await?;
        info!(account = %account.id, email = %account.email, "Admin account provisioned");
        Ok(true)
    }

    async fn get(&self, id: AccountId) -> Result<Account> {
        self.repo.get(id).await?.ok_or(Error::AccountNotFound(id))
    }

    async fn persist(&self, account: &Account) -> Result<()> {
        if self.repo.save(account).await? {
            Ok(())
        } else {
            Err(Error::AccountNotFound(account.id))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::account::credentials::MAX_FAILED_LOGINS;
    use crate::account::{AccessDenied, Role};

    const PASSWORD: &str = "correct horse battery";

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.into(),
            password: PASSWORD.into(),
            confirm_password: PASSWORD.into(),
            full_name: "Ada Investor".into(),
            organization: Some("Fund LLC".into()),
            accredited_investor_attestation: true,
        }
    }

    async fn service() -> (AccountService, AccountId) {
        let service = AccountService::new(AccountRepository::in_memory().await.unwrap());
        assert!(
            service
                .ensure_admin("root@example.com", "admin password", "Root")
                .await
                .unwrap()
        );
        let admin = service.login("root@example.com", "admin password").await.unwrap();
        (service, admin.id)
    }

    #[tokio::test]
    async fn register_creates_pending_investor() {
        let (service, _) = service().await;
        let account = service.register(registration("Ada@Example.com")).await.unwrap();
        assert_eq!(account.email, "ada@example.com");
        assert_eq!(account.role, Role::Investor);
        assert_eq!(account.status, AccountStatus::Pending);
        assert_eq!(service.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let (service, _) = service().await;
        service.register(registration("ada@example.com")).await.unwrap();
        let err = service
            .register(registration("ADA@example.com"))
            .await
            .unwrap_err();
        match err {
            Error::Conflict(message) => {
                assert_eq!(message, "An account with this email already exists");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn registration_requires_attestation() {
        let (service, _) = service().await;
        let err = service
            .register(Registration {
                accredited_investor_attestation: false,
                ..registration("ada@example.com")
            })
            .await
            .unwrap_err();
        let Error::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.0, vec![ValidationError::AttestationRequired]);
        assert_eq!(service.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn pending_investor_cannot_log_in_until_approved() {
        let (service, admin) = service().await;
        let account = service.register(registration("ada@example.com")).await.unwrap();

        let err = service.login("ada@example.com", PASSWORD).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(AccessDenied::PendingApproval)));
        assert!(matches!(
            service.current(account.id).await,
            Err(Error::Forbidden(AccessDenied::PendingApproval))
        ));

        let approved = service.approve(account.id, admin).await.unwrap();
        assert_eq!(approved.status, AccountStatus::Approved);
        assert_eq!(approved.reviewed_by, Some(admin));
        assert!(approved.approved_at.is_some());
        assert_eq!(service.pending_count().await.unwrap(), 0);

        let logged_in = service.login("ADA@example.com", PASSWORD).await.unwrap();
        assert_eq!(logged_in.id, account.id);
        assert_eq!(service.current(account.id).await.unwrap(), approved);
    }

    #[tokio::test]
    async fn rejected_investor_is_refused() {
        let (service, admin) = service().await;
        let account = service.register(registration("ada@example.com")).await.unwrap();
        service.reject(account.id, admin).await.unwrap();

        let err = service.login("ada@example.com", PASSWORD).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(AccessDenied::Rejected)));
        assert!(matches!(
            service.refresh(account.id).await,
            Err(Error::Forbidden(AccessDenied::Rejected))
        ));

        let err = service.reject(account.id, admin).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(ref m) if m == "User is already rejected"));
    }

    #[tokio::test]
    async fn approve_twice_conflicts() {
        let (service, admin) = service().await;
        let account = service.register(registration("ada@example.com")).await.unwrap();
        let first = service.approve(account.id, admin).await.unwrap();

        let err = service.approve(account.id, admin).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(ref m) if m == "User is already approved"));
        assert_eq!(service.current(account.id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn unknown_account_review_is_not_found() {
        let (service, admin) = service().await;
        let id = AccountId::generate();
        assert!(matches!(
            service.approve(id, admin).await,
            Err(Error::AccountNotFound(_))
        ));
        assert!(matches!(
            service.reject(id, admin).await,
            Err(Error::AccountNotFound(_))
        ));
        assert!(matches!(
            service.refresh(id).await,
            Err(Error::Unauthorized(AuthFailure::InvalidToken))
        ));
    }

    #[tokio::test]
    async fn wrong_password_and_lockout() {
        let (service, admin) = service().await;
        let account = service.register(registration("ada@example.com")).await.unwrap();
        service.approve(account.id, admin).await.unwrap();

        assert!(matches!(
            service.login("nobody@example.com", PASSWORD).await,
            Err(Error::Unauthorized(AuthFailure::InvalidCredentials))
        ));

        for _ in 1..MAX_FAILED_LOGINS {
            assert!(matches!(
                service.login("ada@example.com", "wrong").await,
                Err(Error::Unauthorized(AuthFailure::InvalidCredentials))
            ));
        }
        assert!(matches!(
            service.login("ada@example.com", "wrong").await,
            Err(Error::Unauthorized(AuthFailure::LockedOut))
        ));
        assert!(matches!(
            service.login("ada@example.com", PASSWORD).await,
            Err(Error::Unauthorized(AuthFailure::LockedOut))
        ));
    }

    #[tokio::test]
    async fn success_resets_failures() {
        let (service, admin) = service().await;
        let account = service.register(registration("ada@example.com")).await.unwrap();
        service.approve(account.id, admin).await.unwrap();

        for _ in 1..MAX_FAILED_LOGINS {
            let _ = service.login("ada@example.com", "wrong").await;
        }
        service.login("ada@example.com", PASSWORD).await.unwrap();
        for _ in 1..MAX_FAILED_LOGINS {
            assert!(matches!(
                service.login("ada@example.com", "wrong").await,
                Err(Error::Unauthorized(AuthFailure::InvalidCredentials))
            ));
        }
    }

    #[tokio::test]
    async fn profile_update() {
        let (service, admin) = service().await;
        let account = service.register(registration("ada@example.com")).await.unwrap();
        service.approve(account.id, admin).await.unwrap();

        let updated = service
            .update_current(
                account.id,
                ProfileUpdate {
                    full_name: Some("  ".into()),
                    organization: Some("New Fund".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Ada Investor");
        assert_eq!(updated.organization.as_deref(), Some("New Fund"));
        assert_eq!(service.current(account.id).await.unwrap(), updated);

        let err = service
            .update_current(
                account.id,
                ProfileUpdate {
                    full_name: Some("x".repeat(101)),
                    organization: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn admins_bypass_gate_and_bootstrap_is_idempotent() {
        let (service, admin) = service().await;
        assert!(service.current(admin).await.unwrap().is_admin());
        assert!(
            !service
                .ensure_admin("ROOT@example.com", "another password", "Root")
                .await
                .unwrap()
        );
        assert!(matches!(
            service.ensure_admin("bad", "short", "").await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn list_filters_accounts() {
        let (service, admin) = service().await;
        let a = service.register(registration("a@example.com")).await.unwrap();
        service.register(registration("b@example.com")).await.unwrap();
        service.approve(a.id, admin).await.unwrap();

        let pending = service
            .list(AccountFilter {
                status: Some(AccountStatus::Pending),
                ..AccountFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.total_count, 1);
        assert_eq!(pending.items[0].email, "b@example.com");

        let investors = service
            .list(AccountFilter {
                role: Some(Role::Investor),
                ..AccountFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(investors.total_count, 2);

        assert!(matches!(
            service
                .list(AccountFilter {
                    page_size: 0,
                    ..AccountFilter::default()
                })
                .await,
            Err(Error::Validation(_))
        ));
    }
}
