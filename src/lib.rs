/*!
# duckdb-loader

Load CSV and Parquet files into an embedded DuckDB database, browse table
schemas, run ad-hoc SQL and generate synthetic sample datasets.

The library is the thin data-access layer behind the `duckdb-loader-rest`
web UI and the `duckdb-loader` command line tool:

- [`identifier`] turns user-supplied names into safe SQL identifiers
- [`sample`] writes synthetic CSV files
- [`query`] classifies statements and shapes query results
- [`reader`] owns the active DuckDB connection and everything run against it

## Example

```rust,ignore
use duckdb_loader::reader::{ConnectionMode, DuckDBManager};
use duckdb_loader::MAX_ROWS;

let mut manager = DuckDBManager::new();
manager.connect(ConnectionMode::Memory)?;
let table = manager.load_file("data.csv", None)?;
let result = manager.run_query(&format!("SELECT * FROM {}", table), MAX_ROWS)?;
```
*/

pub mod identifier;
pub mod query;
pub mod reader;
pub mod sample;

pub use identifier::sanitize_table_name;
pub use query::{QueryResult, StatementKind};
pub use reader::{ConnectionMode, DuckDBManager, FileKind};
pub use sample::{generate_sample_csv, Distribution, SampleSpec};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of rows returned for any query result
pub const MAX_ROWS: usize = 10_000;

/// Errors produced by the loader
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("mode must be 'memory' or 'file', got '{0}'")]
    InvalidMode(String),

    #[error("db_path required for file mode")]
    MissingPath,

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("DuckDB is not connected")]
    NotConnected,

    #[error("Invalid table name: '{0}'")]
    InvalidIdentifier(String),

    #[error("Only .csv and .parquet files are supported, got '{0}'")]
    UnsupportedFileType(String),

    #[error("Table '{0}' does not exist")]
    UnknownTable(String),

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Query is empty")]
    EmptyQuery,

    #[error("rows must be between 1 and 1,000,000, got {0}")]
    InvalidRowCount(i64),

    #[error("column counts must be between 0 and 1,000")]
    InvalidColumnCount,

    #[error("at least one column is required")]
    NoColumnsRequested,

    #[error("distribution must be 'uniform' or 'normal', got '{0}'")]
    InvalidDistribution(String),

    #[error("{0}")]
    Engine(#[from] duckdb::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl LoaderError {
    /// Stable name of the error kind, for callers that branch on it
    pub fn kind(&self) -> &'static str {
        match self {
            LoaderError::InvalidMode(_) => "InvalidMode",
            LoaderError::MissingPath => "MissingPath",
            LoaderError::InvalidConnectionString(_) => "InvalidConnectionString",
            LoaderError::NotConnected => "NotConnected",
            LoaderError::InvalidIdentifier(_) => "InvalidIdentifier",
            LoaderError::UnsupportedFileType(_) => "UnsupportedFileType",
            LoaderError::UnknownTable(_) => "UnknownTable",
            LoaderError::TableExists(_) => "TableExists",
            LoaderError::EmptyQuery => "EmptyQuery",
            LoaderError::InvalidRowCount(_) => "InvalidRowCount",
            LoaderError::InvalidColumnCount => "InvalidColumnCount",
            LoaderError::NoColumnsRequested => "NoColumnsRequested",
            LoaderError::InvalidDistribution(_) => "InvalidDistribution",
            LoaderError::Engine(_) => "EngineError",
            LoaderError::Io(_) => "IoError",
            LoaderError::Csv(_) => "CsvError",
        }
    }
}

pub type Result<T> = std::result::Result<T, LoaderError>;
