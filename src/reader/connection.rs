//! Connection modes and connection string parsing

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{LoaderError, Result};

const SCHEME: &str = "duckdb://";

/// Where the active database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fresh in-memory database, dropped when replaced
    Memory,
    /// Database file, created if missing
    File(PathBuf),
}

impl ConnectionMode {
    /// Build a mode from the `mode` and `db_path` fields of a connect request.
    ///
    /// `db_path` is ignored in memory mode.
    pub fn from_request(mode: &str, db_path: Option<&str>) -> Result<Self> {
        match mode {
            "memory" => Ok(ConnectionMode::Memory),
            "file" => match db_path {
                Some(path) if !path.is_empty() => Ok(ConnectionMode::File(PathBuf::from(path))),
                _ => Err(LoaderError::MissingPath),
            },
            other => Err(LoaderError::InvalidMode(other.to_string())),
        }
    }

    /// Parse `duckdb://memory` or `duckdb://<path>`
    pub fn from_connection_string(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix(SCHEME)
            .ok_or_else(|| LoaderError::InvalidConnectionString(uri.to_string()))?;
        match rest {
            "" => Err(LoaderError::InvalidConnectionString(uri.to_string())),
            "memory" => Ok(ConnectionMode::Memory),
            path => Ok(ConnectionMode::File(PathBuf::from(path))),
        }
    }

    /// `"memory"` or `"file"`
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionMode::Memory => "memory",
            ConnectionMode::File(_) => "file",
        }
    }

    /// Database path, present only in file mode
    pub fn db_path(&self) -> Option<&Path> {
        match self {
            ConnectionMode::Memory => None,
            ConnectionMode::File(path) => Some(path),
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionMode::Memory => write!(f, "{}memory", SCHEME),
            ConnectionMode::File(path) => write!(f, "{}{}", SCHEME, path.display()),
        }
    }
}
