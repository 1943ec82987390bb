//! SQL query CLI command
//!
//! Provides a command to inspect the published destination tables.

use std::path::PathBuf;

use super::OutputFormat;
use crate::cli::error::CliError;
use crate::cli::runtime;
use crate::config::CatalogConfig;
use crate::database::{DatabaseBackend, DuckDBBackend, QueryResult};

/// Query command arguments
#[derive(Debug, Clone)]
pub struct QueryArgs {
    /// SQL query to execute
    pub sql: String,
    /// Configuration file
    pub config: PathBuf,
    /// DuckDB output path, overrides the configuration
    pub database: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Execute a SQL query against the output database
pub fn handle_query(args: &QueryArgs) -> Result<QueryResult, CliError> {
    let config = CatalogConfig::load(&args.config)?;
    let db_path = args
        .database
        .clone()
        .unwrap_or_else(|| config.duckdb_path());

    if !db_path.exists() {
        return Err(CliError::FileNotFound(db_path));
    }

    let rt = runtime()?;
    let result = rt.block_on(async {
        let backend = DuckDBBackend::new(&db_path)?;
        backend.execute_query(&args.sql).await
    })?;

    match args.format {
        OutputFormat::Text => {
            println!("{}", result.to_table_string());
            eprintln!("\nExecution time: {}ms", result.execution_time_ms);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result.rows)
                .map_err(|e| CliError::IoError(format!("Failed to serialize result: {}", e)))?;
            println!("{}", json);
        }
    }

    Ok(result)
}
