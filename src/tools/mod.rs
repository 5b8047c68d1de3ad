//! CostChef Tools module
//!
//! Tool implementations behind the MCP server. Each function takes the
//! database and typed input and returns a serializable response.

pub mod dishes;
pub mod products;
pub mod status;

use serde::Serialize;
use thiserror::Error;

use crate::costing::CostingError;
use crate::db::DbError;

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE: i64 = 1_000_000;

/// Error type for tool calls
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Costing(#[from] CostingError),

    #[error("{0}")]
    Invalid(String),

    #[error("{entity} not found with id: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ToolError {
    /// Whether the caller can fix the error by changing its input
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ToolError::Costing(_) | ToolError::Invalid(_) | ToolError::NotFound { .. } | ToolError::Conflict(_)
        )
    }
}

impl From<rusqlite::Error> for ToolError {
    fn from(e: rusqlite::Error) -> Self {
        ToolError::Database(DbError::Sqlite(e))
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Whether a SQLite error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Page position returned with every listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current: i64,
    pub pages: i64,
    pub total: i64,
    pub limit: i64,
}

impl Pagination {
    /// Normalise a requested page and limit. Pages start at 1.
    pub fn clamp(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
        let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        (page, limit)
    }

    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            current: page,
            pages: total.saturating_add(limit - 1) / limit,
            total,
            limit,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.current - 1).saturating_mul(self.limit)
    }
}

/// Trim a required name, rejecting blanks
pub(crate) fn required_name(field: &str, value: &str) -> ToolResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ToolError::Invalid(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination() {
        assert_eq!(Pagination::clamp(None, None), (1, 10));
        assert_eq!(Pagination::clamp(Some(0), Some(500)), (1, 100));

        let p = Pagination::new(2, 10, 21);
        assert_eq!(p.pages, 3);
        assert_eq!(p.offset(), 10);

        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let (page, limit) = Pagination::clamp(Some(i64::MAX), Some(100));
        assert_eq!(page, MAX_PAGE);
        let p = Pagination::new(page, limit, 3);
        assert_eq!(p.offset(), (MAX_PAGE - 1) * 100);

        assert_eq!(Pagination::new(i64::MAX, 100, 0).offset(), i64::MAX);
        assert_eq!(Pagination::new(1, 100, i64::MAX).pages, i64::MAX / 100);
    }

    #[test]
    fn test_error_classification() {
        let costing: ToolError = CostingError::UnknownUnit("cup".to_string()).into();
        assert!(costing.is_caller_error());
        assert_eq!(
            ToolError::NotFound { entity: "Dish", id: 4 }.to_string(),
            "Dish not found with id: 4"
        );
        let db: ToolError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(!db.is_caller_error());
    }
}
