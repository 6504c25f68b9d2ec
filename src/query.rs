//! Statement classification and query results
//!
//! Every statement run through the loader is first normalized and classified
//! by its leading keyword. `SELECT` and `WITH` statements are wrapped in an
//! outer query with a `LIMIT`, so the row cap holds no matter what the
//! statement asked for. Everything else runs as written and its result set,
//! if any, is fetched up to the cap.

use serde::Serialize;

use crate::{LoaderError, Result};

/// Alias given to the wrapped subquery
const SUBQUERY_ALIAS: &str = "_q";

/// Acknowledgement returned for statements without a result set
pub const EXECUTED_MESSAGE: &str = "Query executed";

/// Kind of statement, decided by its first keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    With,
    /// DDL, DML, PRAGMA and anything else
    Other,
}

impl StatementKind {
    /// Classify by the first whitespace-delimited token, case-insensitively
    pub fn classify(sql: &str) -> Self {
        match sql.split_whitespace().next() {
            Some(token) if token.eq_ignore_ascii_case("select") => StatementKind::Select,
            Some(token) if token.eq_ignore_ascii_case("with") => StatementKind::With,
            _ => StatementKind::Other,
        }
    }

    /// Whether this kind is wrapped and capped with `LIMIT`
    pub fn is_limited(&self) -> bool {
        matches!(self, StatementKind::Select | StatementKind::With)
    }
}

/// Trim whitespace and a single trailing `;`.
///
/// # Errors
///
/// Returns [`LoaderError::EmptyQuery`] if nothing is left.
pub fn normalize_sql(sql: &str) -> Result<&str> {
    let trimmed = sql.trim();
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
    if trimmed.is_empty() {
        return Err(LoaderError::EmptyQuery);
    }
    Ok(trimmed)
}

/// Wrap a row-returning statement so at most `limit` rows come back.
///
/// The statement ends on its own line so a trailing `--` comment cannot
/// swallow the closing parenthesis.
pub fn limit_query(sql: &str, limit: usize) -> String {
    format!(
        "SELECT * FROM ({}\n) AS {} LIMIT {}",
        sql, SUBQUERY_ALIAS, limit
    )
}

/// Rows returned from a statement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column names, in result order
    pub columns: Vec<String>,
    /// One JSON array per row, values in column order
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Number of rows actually returned
    pub row_count: usize,
    /// Set when the statement produced no result set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        let row_count = rows.len();
        QueryResult {
            columns,
            rows,
            row_count,
            message: None,
        }
    }

    /// Empty result acknowledging a statement without a result set
    pub fn executed() -> Self {
        QueryResult {
            message: Some(EXECUTED_MESSAGE.to_string()),
            ..Default::default()
        }
    }
}
