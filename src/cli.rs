/*!
duckdb-loader Command Line Interface

Generate sample files, and load files and run SQL against DuckDB without
starting the web UI.
*/

use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use duckdb_loader::reader::DuckDBManager;
use duckdb_loader::sample::{generate_sample_csv, SampleSpec};
use duckdb_loader::{MAX_ROWS, VERSION};

#[derive(Parser)]
#[command(name = "duckdb-loader")]
#[command(about = "Load CSV/Parquet files into DuckDB and query them")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a synthetic CSV file and print its path
    Generate {
        /// Number of data rows (1 to 1,000,000)
        #[arg(long)]
        rows: i64,

        /// Number of random string columns
        #[arg(long, default_value = "0")]
        string_cols: i64,

        /// Number of random double columns
        #[arg(long, default_value = "0")]
        double_cols: i64,

        /// Distribution of double values (uniform, normal)
        #[arg(long, default_value = "uniform")]
        distribution: String,
    },

    /// Execute a SQL statement and print the result as JSON
    Exec {
        /// The SQL statement to execute
        sql: String,

        /// Database connection string
        #[arg(long, default_value = "duckdb://memory")]
        db: String,

        /// Files to load before running the statement
        #[arg(long = "load-data")]
        load_data_files: Vec<String>,

        /// Maximum rows to return
        #[arg(long, default_value_t = MAX_ROWS)]
        max_rows: usize,
    },

    /// Print tables and their schemas as JSON
    Tables {
        /// Database connection string
        #[arg(long, default_value = "duckdb://memory")]
        db: String,

        /// Files to load before listing
        #[arg(long = "load-data")]
        load_data_files: Vec<String>,
    },
}

fn open(db: &str, files: &[String]) -> anyhow::Result<DuckDBManager> {
    let manager = DuckDBManager::from_connection_string(db)?;
    for file in files {
        let table = manager.load_file(file, None)?;
        eprintln!("Loaded {} as table '{}'", file, table);
    }
    Ok(manager)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            rows,
            string_cols,
            double_cols,
            distribution,
        } => {
            let spec = SampleSpec::new(rows, string_cols, double_cols, &distribution)?;
            let path = generate_sample_csv(&spec)?;
            println!("{}", path.display());
        }

        Commands::Exec {
            sql,
            db,
            load_data_files,
            max_rows,
        } => {
            let manager = open(&db, &load_data_files)?;
            let result = manager.run_query(&sql, max_rows)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Tables {
            db,
            load_data_files,
        } => {
            let manager = open(&db, &load_data_files)?;
            let tables = manager.list_tables()?;
            let mut schemas = BTreeMap::new();
            for table in &tables {
                schemas.insert(table.clone(), manager.get_schema(table)?);
            }
            let output = serde_json::json!({ "tables": tables, "schemas": schemas });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
