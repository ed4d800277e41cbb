//! Lead storage repository.

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};

use super::model::{InquiryType, Lead, LeadFilter, LeadId, LeadPriority, LeadStatus};
use crate::db::{contains_pattern, format_timestamp, parse_timestamp, search_text};
use crate::page::Page;
use crate::{Error, Result};

const LEAD_COLUMNS: &str = "id, full_name, email, organization, inquiry_type, message, phone, \
                            priority, status, notes, created_at, updated_at";

/// Repository for lead storage and retrieval.
#[derive(Debug, Clone)]
pub struct LeadRepository {
    pool: SqlitePool,
}

impl LeadRepository {
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
            CREATE TABLE IF NOT EXISTS leads (
                id TEXT PRIMARY KEY NOT NULL,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL,
                organization TEXT NOT NULL,
                inquiry_type TEXT NOT NULL,
                message TEXT NOT NULL,
                phone TEXT,
                priority INTEGER NOT NULL,
                status TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                search_text TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        for index in [
            "CREATE INDEX IF NOT EXISTS idx_leads_email ON leads(email)",
            "CREATE INDEX IF NOT EXISTS idx_leads_priority ON leads(priority)",
            "CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status)",
            "CREATE INDEX IF NOT EXISTS idx_leads_created_at ON leads(created_at)",
        ] {
            sqlx::query(index).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Insert a new lead.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn insert(&self, lead: &Lead) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO leads
                (id, full_name, email, organization, inquiry_type, message, phone,
                 priority, status, notes, created_at, updated_at, search_text)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(lead.id.0.to_string())
        .bind(&lead.full_name)
        .bind(&lead.email)
        .bind(&lead.organization)
        .bind(lead.inquiry_type.as_str())
        .bind(&lead.message)
        .bind(&lead.phone)
        .bind(lead.priority.rank())
        .bind(lead.status.as_str())
        .bind(&lead.notes)
        .bind(format_timestamp(lead.created_at))
        .bind(format_timestamp(lead.updated_at))
        .bind(search_text([
            lead.full_name.as_str(),
            lead.email.as_str(),
            lead.organization.as_str(),
        ]))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a lead by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: LeadId) -> Result<Option<Lead>> {
        let row = sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?"))
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_lead).transpose()
    }

    /// Persist the mutable fields of a lead (status, notes, `updated_at`).
    ///
    /// Returns `false` if no such lead exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn save(&self, lead: &Lead) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE leads SET status = ?, notes = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(lead.status.as_str())
        .bind(&lead.notes)
        .bind(format_timestamp(lead.updated_at))
        .bind(lead.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List leads matching a filter, most urgent first and newest first
    /// within a priority.
    ///
    /// The filter's paging must already be normalized.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: &LeadFilter) -> Result<Page<Lead>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM leads");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {LEAD_COLUMNS} FROM leads"));
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY priority DESC, created_at DESC, id LIMIT ")
            .push_bind(i64::from(filter.page_size))
            .push(" OFFSET ")
            .push_bind(Page::<Lead>::offset(filter.page, filter.page_size));

        let rows = select.build().fetch_all(&self.pool).await?;
        let items = rows.iter().map(row_to_lead).collect::<Result<Vec<_>>>()?;

        Ok(Page::new(
            items,
            u64::try_from(total).unwrap_or_default(),
            filter.page,
            filter.page_size,
        ))
    }

    /// Count all stored leads.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(total).unwrap_or_default())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &LeadFilter) {
    query.push(" WHERE 1 = 1");
    if let Some(priority) = filter.priority {
        query.push(" AND priority = ").push_bind(priority.rank());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        query
            .push(" AND search_text LIKE ")
            .push_bind(contains_pattern(search))
            .push(" ESCAPE '\\'");
    }
}

fn row_to_lead(row: &SqliteRow) -> Result<Lead> {
    let id: String = row.try_get("id")?;
    let inquiry_type: String = row.try_get("inquiry_type")?;
    let priority: i64 = row.try_get("priority")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Lead {
        id: LeadId(
            id.parse()
                .map_err(|e| Error::Corrupt(format!("bad lead id {id:?}: {e}")))?,
        ),
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        organization: row.try_get("organization")?,
        inquiry_type: InquiryType::parse(&inquiry_type)
            .ok_or_else(|| Error::Corrupt(format!("bad inquiry type {inquiry_type:?}")))?,
        message: row.try_get("message")?,
        phone: row.try_get("phone")?,
        priority: LeadPriority::from_rank(priority)
            .ok_or_else(|| Error::Corrupt(format!("bad priority rank {priority}")))?,
        status: LeadStatus::parse(&status)
            .ok_or_else(|| Error::Corrupt(format!("bad lead status {status:?}")))?,
        notes: row.try_get("notes")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
