//! Database backend abstraction for the destination tables
//!
//! This module provides the write side of the pipeline:
//! - DuckDB: embedded database, file-based or in-memory
//!
//! Each destination is replaced as a whole on every run. Backends are
//! driven by the [`SyncEngine`], which isolates failures per destination.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "duckdb-backend")]
pub mod duckdb;

pub mod schema;
pub mod sync;

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::DuckDBBackend;

pub use schema::{DatabaseSchema, Destination, DestinationTables};
pub use sync::{SyncEngine, SyncResult, WriteOutcome};

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Writing a destination failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Creating destination tables failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Transaction failed
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Query result row as a JSON value
pub type QueryRow = serde_json::Value;

/// Query result set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Rows of data, keyed by column name
    pub rows: Vec<QueryRow>,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<QueryRow>) -> Self {
        Self {
            columns,
            rows,
            execution_time_ms: 0,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as an aligned text table
    pub fn to_table_string(&self) -> String {
        let cell = |row: &QueryRow, col: &str| match row.get(col) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => "NULL".to_string(),
            Some(other) => other.to_string(),
        };

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        for row in &self.rows {
            for (width, col) in widths.iter_mut().zip(&self.columns) {
                *width = (*width).max(cell(row, col).len());
            }
        }

        let line = |values: Vec<String>| -> String {
            values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:w$}", v, w = *w))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        let mut output = line(self.columns.clone());
        output.push('\n');
        output.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        output.push('\n');
        for row in &self.rows {
            output.push_str(&line(
                self.columns.iter().map(|c| cell(row, c)).collect(),
            ));
            output.push('\n');
        }
        output.push_str(&format!("({} rows)", self.row_count()));
        output
    }
}

/// Database backend trait for the destination tables
#[async_trait(?Send)]
pub trait DatabaseBackend {
    /// Create every destination table (and schema) that does not exist yet
    async fn initialize(&self, destinations: &DestinationTables) -> DatabaseResult<()>;

    /// Replace the content of one destination table with `rows`
    ///
    /// Runs in a single transaction: either every row is written or the
    /// previous content is kept.
    ///
    /// # Returns
    /// Number of rows written
    async fn replace_rows(
        &self,
        table_name: &str,
        destination: Destination,
        rows: &[Vec<Option<String>>],
    ) -> DatabaseResult<usize>;

    /// Execute a SQL query and return results
    async fn execute_query(&self, sql: &str) -> DatabaseResult<QueryResult>;

    /// Check if database is healthy and accessible
    async fn health_check(&self) -> DatabaseResult<bool>;

    /// Backend type string ("duckdb")
    fn backend_type(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_result_table_string() {
        let result = QueryResult::new(
            vec!["db_name".to_string(), "table_name".to_string()],
            vec![
                serde_json::json!({"db_name": "sales", "table_name": "orders"}),
                serde_json::json!({"db_name": "hr", "table_name": null}),
            ],
        );

        let output = result.to_table_string();
        assert!(output.starts_with("db_name | table_name"));
        assert!(output.contains("sales   | orders"));
        assert!(output.contains("NULL"));
        assert!(output.ends_with("(2 rows)"));
    }

    #[test]
    fn test_query_result_empty() {
        let result = QueryResult::new(vec!["a".to_string()], Vec::new());
        assert!(result.is_empty());
        assert!(result.to_table_string().ends_with("(0 rows)"));
    }
}
