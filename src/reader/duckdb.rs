//! DuckDB-backed connection manager

use std::path::Path;

use duckdb::types::{TimeUnit, Value};
use duckdb::{params, Connection};
use tracing::{debug, info};

use super::{ConnectionMode, FileKind};
use crate::identifier::sanitize_table_name;
use crate::query::{limit_query, normalize_sql, QueryResult, StatementKind};
use crate::{LoaderError, Result};

/// An open connection and the mode it was opened with
struct ActiveConnection {
    mode: ConnectionMode,
    conn: Connection,
}

/// Owner of the single active DuckDB connection.
///
/// Starts disconnected. [`connect`](Self::connect) opens a new connection and
/// replaces the previous one wholesale; in memory mode every table of the old
/// connection is gone afterwards. A failed `connect` leaves the previous
/// connection in place.
///
/// DuckDB connections are `Send` but not `Sync`, so callers sharing a manager
/// between threads wrap it in a mutex.
#[derive(Default)]
pub struct DuckDBManager {
    active: Option<ActiveConnection>,
}

impl DuckDBManager {
    /// Create a manager with no connection
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager connected according to `duckdb://memory` or `duckdb://<path>`
    pub fn from_connection_string(uri: &str) -> Result<Self> {
        let mut manager = Self::new();
        manager.connect(ConnectionMode::from_connection_string(uri)?)?;
        Ok(manager)
    }

    /// Open a new connection and make it the active one
    pub fn connect(&mut self, mode: ConnectionMode) -> Result<()> {
        let conn = match &mode {
            ConnectionMode::Memory => Connection::open_in_memory()?,
            ConnectionMode::File(path) => Connection::open(path)?,
        };
        info!("Connected to {}", mode);
        self.active = Some(ActiveConnection { mode, conn });
        Ok(())
    }

    /// Mode of the active connection, if any
    pub fn mode(&self) -> Option<&ConnectionMode> {
        self.active.as_ref().map(|a| &a.mode)
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// The active connection
    pub fn connection(&self) -> Result<&Connection> {
        self.active
            .as_ref()
            .map(|a| &a.conn)
            .ok_or(LoaderError::NotConnected)
    }

    /// Create or replace a table with the full contents of a CSV or Parquet file.
    ///
    /// The table is named after `table_name`, or the file stem when no name is
    /// given, after sanitizing. Returns the final table name.
    pub fn load_file(&self, path: &str, table_name: Option<&str>) -> Result<String> {
        let conn = self.connection()?;
        let file = Path::new(path);

        let name = match table_name.filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => file.file_stem().and_then(|s| s.to_str()).unwrap_or(""),
        };
        let table = sanitize_table_name(name)?;
        let kind = FileKind::from_path(file)?;

        info!("Loading {} into table '{}'", path, table);
        let sql = format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM {}(?)",
            table,
            kind.table_function()
        );
        conn.execute(&sql, params![path])?;

        Ok(table)
    }

    /// Names of all tables in the catalog, in DuckDB's order
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SHOW TABLES")?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tables)
    }

    /// Whether a table with this (sanitized) name exists.
    ///
    /// DuckDB resolves identifiers case-insensitively, and so does this check.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let table = sanitize_table_name(table)?;
        Ok(self
            .list_tables()?
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&table)))
    }

    /// Ordered `(column_name, column_type)` pairs of a table
    pub fn get_schema(&self, table: &str) -> Result<Vec<(String, String)>> {
        let conn = self.connection()?;
        let table = sanitize_table_name(table)?;
        if !self.table_exists(&table)? {
            return Err(LoaderError::UnknownTable(table));
        }

        let mut stmt = conn.prepare(&format!("DESCRIBE {}", table))?;
        let columns = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    /// Rename a table; `old` must exist and `new` must not
    pub fn rename_table(&self, old: &str, new: &str) -> Result<()> {
        let conn = self.connection()?;
        let old = sanitize_table_name(old)?;
        let new = sanitize_table_name(new)?;

        if !self.table_exists(&old)? {
            return Err(LoaderError::UnknownTable(old));
        }
        if self.table_exists(&new)? {
            return Err(LoaderError::TableExists(new));
        }

        conn.execute_batch(&format!("ALTER TABLE {} RENAME TO {}", old, new))?;
        info!("Renamed table '{}' to '{}'", old, new);
        Ok(())
    }

    /// Run a statement and return at most `limit` rows.
    ///
    /// `SELECT` and `WITH` statements are wrapped as a subquery with
    /// `LIMIT limit`. Other statements run as written; if they produce a
    /// result set the first `limit` rows are fetched, otherwise the result is
    /// empty and carries an acknowledgement message.
    pub fn run_query(&self, sql: &str, limit: usize) -> Result<QueryResult> {
        let conn = self.connection()?;
        let sql = normalize_sql(sql)?;
        let kind = StatementKind::classify(sql);

        if kind.is_limited() {
            let limited = limit_query(sql, limit);
            debug!("Executing {:?} statement: {}", kind, limited);
            let (columns, rows) = fetch_rows(conn, &limited, None)?;
            return Ok(QueryResult::new(columns, rows));
        }

        debug!("Executing statement: {}", sql);
        let (columns, rows) = fetch_rows(conn, sql, Some(limit))?;
        if !has_result_set(&columns, &rows) {
            return Ok(QueryResult::executed());
        }
        Ok(QueryResult::new(columns, rows))
    }
}

type Rows = Vec<Vec<serde_json::Value>>;

/// Column DuckDB reports for statements that return nothing (DDL and the like)
const NO_RESULT_COLUMN: &str = "Count";

/// Whether a statement produced rows worth returning.
///
/// DDL comes back either with no columns or with a lone `Count` column and
/// no rows. DML reports its affected-row count in that column and keeps it.
fn has_result_set(columns: &[String], rows: &Rows) -> bool {
    match columns {
        [] => false,
        [only] if only == NO_RESULT_COLUMN => !rows.is_empty(),
        _ => true,
    }
}

/// Execute `sql` and read up to `limit` rows without fetching the rest
fn fetch_rows(conn: &Connection, sql: &str, limit: Option<usize>) -> Result<(Vec<String>, Rows)> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let columns = rows
        .as_ref()
        .map(|stmt| stmt.column_names())
        .unwrap_or_default();

    let mut out = Vec::new();
    while limit.map_or(true, |limit| out.len() < limit) {
        let Some(row) = rows.next()? else {
            break;
        };
        let values = (0..columns.len())
            .map(|i| row.get::<_, Value>(i).map(value_to_json))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        out.push(values);
    }

    Ok((columns, out))
}

/// Convert a single DuckDB value to JSON
fn value_to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => b.into(),
        Value::TinyInt(v) => v.into(),
        Value::SmallInt(v) => v.into(),
        Value::Int(v) => v.into(),
        Value::BigInt(v) => v.into(),
        Value::UTinyInt(v) => v.into(),
        Value::USmallInt(v) => v.into(),
        Value::UInt(v) => v.into(),
        Value::UBigInt(v) => v.into(),
        Value::HugeInt(v) => serde_json::Value::String(v.to_string()),
        Value::Float(v) => float_to_json(v as f64),
        Value::Double(v) => float_to_json(v),
        Value::Decimal(d) => serde_json::Value::String(d.to_string()),
        Value::Text(s) | Value::Enum(s) => serde_json::Value::String(s),
        Value::Date32(days) => chrono::DateTime::from_timestamp(days as i64 * 86_400, 0)
            .map(|dt| serde_json::Value::String(dt.date_naive().format("%Y-%m-%d").to_string()))
            .unwrap_or(serde_json::Value::Null),
        Value::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.saturating_mul(1_000_000),
                TimeUnit::Millisecond => v.saturating_mul(1_000),
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            chrono::DateTime::from_timestamp_micros(micros)
                .map(|dt| {
                    serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
                })
                .unwrap_or(serde_json::Value::Null)
        }
        Value::List(items) => {
            serde_json::Value::Array(items.into_iter().map(value_to_json).collect())
        }
        other => {
            debug!("Converting unsupported DuckDB type to string: {:?}", other);
            serde_json::Value::String(format!("{:?}", other))
        }
    }
}

fn float_to_json(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
