//! Account storage repository.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use super::credentials::StoredCredential;
use super::model::{Account, AccountFilter, AccountId, AccountStatus, Role, normalize_email};
use crate::db::{
    contains_pattern, format_timestamp, is_unique_violation, parse_optional_timestamp,
    parse_timestamp, search_text,
};
use crate::page::Page;
use crate::{Error, Result};

const ACCOUNT_COLUMNS: &str = "id, email, full_name, organization, role, status, created_at, \
                               approved_at, rejected_at, reviewed_by";

/// Repository for account storage and retrieval.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        Self::from_pool(crate::db::open(database_path).await?).await
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        Self::from_pool(crate::db::open_in_memory().await?).await
    }

    /// Create a repository on an existing pool, creating tables if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY NOT NULL,
                email TEXT NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                organization TEXT,
                role TEXT NOT NULL,
                status TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                failed_logins INTEGER NOT NULL DEFAULT 0,
                lockout_until TEXT,
                created_at TEXT NOT NULL,
                approved_at TEXT,
                rejected_at TEXT,
                reviewed_by TEXT,
                search_text TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_accounts_status ON accounts(status)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a new account with its credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the email is taken, or a database error.
    pub async fn create(&self, account: &Account, credential: &StoredCredential) -> Result<()> {
        let result = sqlx::query(
            r"
            INSERT INTO accounts
                (id, email, full_name, organization, role, status, password_hash,
                 failed_logins, lockout_until, created_at, approved_at, rejected_at, reviewed_by,
                 search_text)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(account.id.0.to_string())
        .bind(normalize_email(&account.email))
        .bind(&account.full_name)
        .bind(&account.organization)
        .bind(account.role.as_str())
        .bind(account.status.as_str())
        .bind(&credential.password_hash)
        .bind(i64::from(credential.failed_logins))
        .bind(credential.lockout_until.map(format_timestamp))
        .bind(format_timestamp(account.created_at))
        .bind(account.approved_at.map(format_timestamp))
        .bind(account.rejected_at.map(format_timestamp))
        .bind(account.reviewed_by.map(|id| id.0.to_string()))
        .bind(account_search_text(account))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::Conflict(
                "An account with this email already exists".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
        ))
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Get an account by email, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Get an account and its credential by email, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(Account, StoredCredential)>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS}, password_hash, failed_logins, lockout_until \
             FROM accounts WHERE email = ?"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let failed_logins: i64 = row.try_get("failed_logins")?;
        let credential = StoredCredential {
            password_hash: row.try_get("password_hash")?,
            failed_logins: u32::try_from(failed_logins).unwrap_or_default(),
            lockout_until: parse_optional_timestamp(row.try_get("lockout_until")?)?,
        };
        Ok(Some((row_to_account(&row)?, credential)))
    }

    /// Stores the failure counter after a bad password.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn record_login_failure(
        &self,
        id: AccountId,
        failed_logins: u32,
        lockout_until: Option<DateTime<Utc>>,
    ) -> Result<()> {
        sqlx::query("UPDATE accounts SET failed_logins = ?, lockout_until = ? WHERE id = ?")
            .bind(i64::from(failed_logins))
            .bind(lockout_until.map(format_timestamp))
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;
        debug!(
            account = %id,
            failed_logins,
            locked = lockout_until.is_some(),
            "Recorded login failure"
        );
        Ok(())
    }

    /// Clears the failure counter and any lockout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn reset_login_failures(&self, id: AccountId) -> Result<()> {
        sqlx::query("UPDATE accounts SET failed_logins = 0, lockout_until = NULL WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Persist profile and review fields of an account.
    ///
    /// Returns `false` if no such account exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn save(&self, account: &Account) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE accounts SET
                full_name = ?, organization = ?, status = ?,
                approved_at = ?, rejected_at = ?, reviewed_by = ?, search_text = ?
            WHERE id = ?
            ",
        )
        .bind(&account.full_name)
        .bind(&account.organization)
        .bind(account.status.as_str())
        .bind(account.approved_at.map(format_timestamp))
        .bind(account.rejected_at.map(format_timestamp))
        .bind(account.reviewed_by.map(|id| id.0.to_string()))
        .bind(account_search_text(account))
        .bind(account.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count accounts in a given state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_by_status(&self, status: AccountStatus) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// List accounts matching a filter, newest first.
    ///
    /// The filter's paging must already be normalized.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: &AccountFilter) -> Result<Page<Account>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM accounts");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {ACCOUNT_COLUMNS} FROM accounts"));
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(i64::from(filter.page_size))
            .push(" OFFSET ")
            .push_bind(Page::<Account>::offset(filter.page, filter.page_size));

        let rows = select.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(row_to_account)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(
            items,
            u64::try_from(total).unwrap_or_default(),
            filter.page,
            filter.page_size,
        ))
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &AccountFilter) {
    query.push(" WHERE 1 = 1");
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(role) = filter.role {
        query.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        query
            .push(" AND search_text LIKE ")
            .push_bind(contains_pattern(search))
            .push(" ESCAPE '\\'");
    }
}

fn account_search_text(account: &Account) -> String {
    search_text([
        normalize_email(&account.email).as_str(),
        account.full_name.as_str(),
        account.organization.as_deref().unwrap_or_default(),
    ])
}

fn parse_account_id(value: &str) -> Result<AccountId> {
    value
        .parse()
        .map(AccountId)
        .map_err(|e| Error::Corrupt(format!("bad account id {value:?}: {e}")))
}

fn row_to_account(row: &SqliteRow) -> Result<Account> {
    let id: String = row.try_get("id")?;
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let reviewed_by: Option<String> = row.try_get("reviewed_by")?;

    Ok(Account {
        id: parse_account_id(&id)?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        organization: row.try_get("organization")?,
        role: Role::parse(&role).ok_or_else(|| Error::Corrupt(format!("bad role {role:?}")))?,
        status: AccountStatus::parse(&status)
            .ok_or_else(|| Error::Corrupt(format!("bad account status {status:?}")))?,
        created_at: parse_timestamp(&created_at)?,
        approved_at: parse_optional_timestamp(row.try_get("approved_at")?)?,
        rejected_at: parse_optional_timestamp(row.try_get("rejected_at")?)?,
        reviewed_by: reviewed_by.as_deref().map(parse_account_id).transpose()?,
    })
}
