//! Data access layer for duckdb-loader
//!
//! The reader module owns the single active DuckDB connection and everything
//! that runs against it.
//!
//! # Architecture
//!
//! - [`ConnectionMode`] says where the database lives (memory or a file)
//! - [`FileKind`] decides how a data file is read into a table
//! - [`DuckDBManager`] holds the connection, replaces it wholesale on
//!   [`connect`](DuckDBManager::connect), and runs loads, catalog lookups,
//!   renames and row-capped queries
//!
//! # Example
//!
//! ```rust,ignore
//! use duckdb_loader::reader::{ConnectionMode, DuckDBManager};
//!
//! let mut manager = DuckDBManager::new();
//! manager.connect(ConnectionMode::Memory)?;
//! let table = manager.load_file("penguins.parquet", None)?;
//! let schema = manager.get_schema(&table)?;
//! ```

use std::path::Path;

use crate::{LoaderError, Result};

pub mod connection;
pub mod duckdb;

pub use self::connection::ConnectionMode;
pub use self::duckdb::DuckDBManager;

/// Data file formats that can be loaded into a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Parquet,
}

impl FileKind {
    /// Detect the kind from the file extension, case-insensitively
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "csv" => Ok(FileKind::Csv),
            "parquet" => Ok(FileKind::Parquet),
            _ => Err(LoaderError::UnsupportedFileType(extension)),
        }
    }

    /// DuckDB table function that reads this kind of file
    pub fn table_function(&self) -> &'static str {
        match self {
            FileKind::Csv => "read_csv_auto",
            FileKind::Parquet => "read_parquet",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("a.csv")).unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_path(Path::new("/x/A.CSV")).unwrap(), FileKind::Csv);
        assert_eq!(
            FileKind::from_path(Path::new("b.Parquet")).unwrap(),
            FileKind::Parquet
        );
    }

    #[test]
    fn test_unsupported_extensions() {
        for path in ["c.json", "noext", "archive.csv.gz"] {
            assert!(matches!(
                FileKind::from_path(Path::new(path)),
                Err(LoaderError::UnsupportedFileType(_))
            ));
        }
    }
}
