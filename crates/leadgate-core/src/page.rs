//! Paginated result envelope.

use serde::Serialize;

use crate::validation::{ValidationError, ValidationErrors};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page a caller may request; bigger requests are clamped.
pub const MAX_PAGE_SIZE: u32 = 100;

pub(crate) const fn default_page() -> u32 {
    1
}

pub(crate) const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Checks paging parameters and returns `(page, page_size)` with the size
/// clamped to [`MAX_PAGE_SIZE`].
pub(crate) fn normalize(page: u32, page_size: u32) -> Result<(u32, u32), ValidationErrors> {
    let mut errors = Vec::new();
    if page == 0 {
        errors.push(ValidationError::InvalidPage);
    }
    if page_size == 0 {
        errors.push(ValidationError::InvalidPageSize);
    }
    if errors.is_empty() {
        Ok((page, page_size.min(MAX_PAGE_SIZE)))
    } else {
        Err(ValidationErrors(errors))
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    #[serde(rename = "data")]
    pub items: Vec<T>,
    /// Number of records matching the filter across all pages.
    pub total_count: u64,
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// `ceil(total_count / page_size)`.
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, total_count: u64, page: u32, page_size: u32) -> Self {
        let total_pages = total_count.div_ceil(u64::from(page_size.max(1)));
        Self {
            items,
            total_count,
            page,
            page_size,
            total_pages,
        }
    }

    /// Row offset of the first item on `page`.
    pub(crate) fn offset(page: u32, page_size: u32) -> i64 {
        i64::from(page.saturating_sub(1)) * i64::from(page_size)
    }
}
