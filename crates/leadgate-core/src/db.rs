//! Shared `SQLite` plumbing for the repositories.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::{Error, Result};

/// Opens (creating if needed) the database file at `database_path`.
///
/// # Errors
///
/// Returns an error if the database connection fails.
pub async fn open(database_path: &str) -> Result<SqlitePool> {
    let url = format!("sqlite:{database_path}?mode=rwc");
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;
    Ok(pool)
}

/// Opens a private in-memory database.
///
/// The pool holds exactly one connection that is never recycled, so every
/// query sees the same database.
///
/// # Errors
///
/// Returns an error if the database connection fails.
pub async fn open_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}

/// Current time at the precision we persist.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 text, so lexical order matches time order.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Corrupt(format!("bad timestamp {value:?}: {e}")))
}

pub(crate) fn parse_optional_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_timestamp).transpose()
}

/// Lowercased, newline-joined copy of the searchable fields of a row.
///
/// `SQLite`'s `LOWER` folds ASCII only, so searches match this column
/// instead of the raw fields.
pub(crate) fn search_text<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields
        .into_iter()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern and wraps
/// the lowercased needle in wildcards.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width_and_round_trip() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 0).unwrap();
        let text = format_timestamp(at);
        assert_eq!(text, "2026-03-01T09:05:00.000000Z");
        assert_eq!(parse_timestamp(&text).unwrap(), at);
    }

    #[test]
    fn now_survives_storage() {
        let at = now();
        assert_eq!(parse_timestamp(&format_timestamp(at)).unwrap(), at);
    }

    #[test]
    fn bad_timestamp_is_corrupt() {
        assert!(matches!(parse_timestamp("yesterday"), Err(Error::Corrupt(_))));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern(" Acme "), "%acme%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("ÉLODIE"), "%élodie%");
    }

    #[test]
    fn search_text_folds_unicode() {
        assert_eq!(
            search_text(["ÉLODIE Ørsted", "e@x.fr", "Ministère"]),
            "élodie ørsted\ne@x.fr\nministère"
        );
    }
}
