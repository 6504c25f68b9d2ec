//! Synthetic sample data
//!
//! Writes CSV files with `str_1..str_N` columns of random lowercase words
//! followed by `dbl_1..dbl_M` columns of random doubles. Files land in
//! [`sample_dir`] under a name derived from the row and column counts only,
//! so two requests that differ only in distribution overwrite each other.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::Rng;
use rand_distr::StandardNormal;
use tracing::info;

use crate::{LoaderError, Result};

/// Largest number of rows a sample file may have
pub const MAX_SAMPLE_ROWS: i64 = 1_000_000;

/// Largest number of string or double columns a sample file may have
pub const MAX_SAMPLE_COLUMNS: i64 = 1_000;

/// Length of every generated string cell
const STRING_LEN: usize = 8;

/// Distribution used for double columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Distribution {
    /// Values in `[0, 1)`
    #[default]
    Uniform,
    /// Standard normal, mean 0 and standard deviation 1
    Normal,
}

impl FromStr for Distribution {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "uniform" => Ok(Distribution::Uniform),
            "normal" => Ok(Distribution::Normal),
            other => Err(LoaderError::InvalidDistribution(other.to_string())),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Uniform => write!(f, "uniform"),
            Distribution::Normal => write!(f, "normal"),
        }
    }
}

/// Validated parameters of a sample file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSpec {
    pub rows: usize,
    pub string_cols: usize,
    pub double_cols: usize,
    pub distribution: Distribution,
}

impl SampleSpec {
    /// Validate raw request values.
    ///
    /// Checks run in order: row count, column counts, at least one column,
    /// distribution name.
    pub fn new(rows: i64, string_cols: i64, double_cols: i64, distribution: &str) -> Result<Self> {
        if !(1..=MAX_SAMPLE_ROWS).contains(&rows) {
            return Err(LoaderError::InvalidRowCount(rows));
        }
        let columns = 0..=MAX_SAMPLE_COLUMNS;
        if !columns.contains(&string_cols) || !columns.contains(&double_cols) {
            return Err(LoaderError::InvalidColumnCount);
        }
        match string_cols.checked_add(double_cols) {
            Some(0) => return Err(LoaderError::NoColumnsRequested),
            Some(_) => {}
            None => return Err(LoaderError::InvalidColumnCount),
        }
        let distribution = distribution.parse()?;

        Ok(SampleSpec {
            rows: rows as usize,
            string_cols: string_cols as usize,
            double_cols: double_cols as usize,
            distribution,
        })
    }

    /// Header row: string columns first, then double columns
    pub fn headers(&self) -> Vec<String> {
        (1..=self.string_cols)
            .map(|i| format!("str_{}", i))
            .chain((1..=self.double_cols).map(|i| format!("dbl_{}", i)))
            .collect()
    }

    /// File name derived from the row and column counts; the distribution does not take part
    pub fn file_name(&self) -> String {
        format!(
            "sample_{}_{}_{}.csv",
            self.rows, self.string_cols, self.double_cols
        )
    }
}

/// Directory generated files are written to
pub fn sample_dir() -> PathBuf {
    std::env::temp_dir().join("duckdb_loader")
}

/// Generate a sample CSV in [`sample_dir`] and return its path
pub fn generate_sample_csv(spec: &SampleSpec) -> Result<PathBuf> {
    generate_sample_csv_in(&sample_dir(), spec)
}

/// Generate a sample CSV inside `dir`, creating the directory if needed
pub fn generate_sample_csv_in(dir: &Path, spec: &SampleSpec) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(spec.file_name());

    let mut rng = rand::thread_rng();
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(spec.headers())?;

    let mut record = Vec::with_capacity(spec.string_cols + spec.double_cols);
    for _ in 0..spec.rows {
        record.clear();
        record.extend((0..spec.string_cols).map(|_| random_word(&mut rng)));
        record.extend(
            (0..spec.double_cols).map(|_| random_double(&mut rng, spec.distribution).to_string()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;

    info!(
        "Generated {} rows ({} string, {} double, {}) at {}",
        spec.rows,
        spec.string_cols,
        spec.double_cols,
        spec.distribution,
        path.display()
    );
    Ok(path)
}

fn random_word<R: Rng>(rng: &mut R) -> String {
    (0..STRING_LEN)
        .map(|_| rng.gen_range(b'a'..=b'z') as char)
        .collect()
}

fn random_double<R: Rng>(rng: &mut R, distribution: Distribution) -> f64 {
    match distribution {
        Distribution::Uniform => rng.gen::<f64>(),
        Distribution::Normal => rng.sample(StandardNormal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_back(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader
            .headers()
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(|s| s.to_string()).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn test_uniform_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let spec = SampleSpec::new(100, 2, 3, "uniform").unwrap();
        let path = generate_sample_csv_in(dir.path(), &spec).unwrap();

        let (headers, rows) = read_back(&path);
        assert_eq!(headers, vec!["str_1", "str_2", "dbl_1", "dbl_2", "dbl_3"]);
        assert_eq!(rows.len(), 100);

        for row in &rows {
            assert_eq!(row.len(), 5);
            for cell in &row[..2] {
                assert_eq!(cell.len(), 8);
                assert!(cell.bytes().all(|b| b.is_ascii_lowercase()));
            }
            for cell in &row[2..] {
                let value: f64 = cell.parse().unwrap();
                assert!((0.0..1.0).contains(&value));
            }
        }
    }

    #[test]
    fn test_normal_values_are_spread_around_zero() {
        let dir = tempfile::tempdir().unwrap();
        let spec = SampleSpec::new(2000, 0, 1, "normal").unwrap();
        let path = generate_sample_csv_in(dir.path(), &spec).unwrap();

        let (headers, rows) = read_back(&path);
        assert_eq!(headers, vec!["dbl_1"]);
        let values: Vec<f64> = rows.iter().map(|r| r[0].parse().unwrap()).collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        assert!(mean.abs() < 0.2, "mean was {}", mean);
        assert!(values.iter().any(|v| *v < 0.0));
        assert!(values.iter().any(|v| *v > 1.0 || *v < -1.0));
    }

    #[test]
    fn test_file_name_ignores_distribution() {
        let dir = tempfile::tempdir().unwrap();
        let uniform = SampleSpec::new(10, 1, 1, "uniform").unwrap();
        let normal = SampleSpec::new(10, 1, 1, "normal").unwrap();

        let first = generate_sample_csv_in(dir.path(), &uniform).unwrap();
        let second = generate_sample_csv_in(dir.path(), &normal).unwrap();
        assert_eq!(first, second);
        assert!(first.ends_with("sample_10_1_1.csv"));
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let spec = SampleSpec::new(1, 1, 0, "uniform").unwrap();
        let path = generate_sample_csv_in(&nested, &spec).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_validation_order() {
        assert!(matches!(
            SampleSpec::new(0, 1, 0, "uniform"),
            Err(LoaderError::InvalidRowCount(0))
        ));
        assert!(matches!(
            SampleSpec::new(1_000_001, 1, 0, "uniform"),
            Err(LoaderError::InvalidRowCount(_))
        ));
        assert!(matches!(
            SampleSpec::new(10, -1, 2, "uniform"),
            Err(LoaderError::InvalidColumnCount)
        ));
        assert!(matches!(
            SampleSpec::new(10, 0, 0, "uniform"),
            Err(LoaderError::NoColumnsRequested)
        ));
        assert!(matches!(
            SampleSpec::new(10, 1, 0, "poisson"),
            Err(LoaderError::InvalidDistribution(_))
        ));
        assert!(SampleSpec::new(1_000_000, 1, 0, "normal").is_ok());
    }

    #[test]
    fn test_column_counts_are_bounded() {
        assert!(matches!(
            SampleSpec::new(10, i64::MAX, 1, "uniform"),
            Err(LoaderError::InvalidColumnCount)
        ));
        assert!(matches!(
            SampleSpec::new(10, i64::MAX, i64::MAX, "uniform"),
            Err(LoaderError::InvalidColumnCount)
        ));
        assert!(matches!(
            SampleSpec::new(10, 1, 1_000_000_000, "uniform"),
            Err(LoaderError::InvalidColumnCount)
        ));
        assert!(matches!(
            SampleSpec::new(10, MAX_SAMPLE_COLUMNS + 1, 0, "uniform"),
            Err(LoaderError::InvalidColumnCount)
        ));
        let spec = SampleSpec::new(1, MAX_SAMPLE_COLUMNS, MAX_SAMPLE_COLUMNS, "uniform").unwrap();
        assert_eq!(spec.headers().len(), 2 * MAX_SAMPLE_COLUMNS as usize);
    }
}
