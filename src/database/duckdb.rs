//! DuckDB database backend implementation
//!
//! Provides an embedded database for the destination tables. Supports both
//! file-based persistence and in-memory mode.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use super::schema::{DatabaseSchema, Destination, DestinationTables};
use super::{DatabaseBackend, DatabaseError, DatabaseResult, QueryResult};

/// DuckDB database backend
pub struct DuckDBBackend {
    /// Path to the database file (None for in-memory)
    db_path: Option<PathBuf>,
    /// DuckDB connection (wrapped in Mutex for interior mutability)
    connection: Mutex<duckdb::Connection>,
}

impl DuckDBBackend {
    /// Create a new DuckDB backend with a file-based database
    pub fn new(db_path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = db_path.as_ref().to_path_buf();
        let connection = duckdb::Connection::open(&path).map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to open DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: Some(path),
            connection: Mutex::new(connection),
        })
    }

    /// Create an in-memory DuckDB backend
    pub fn in_memory() -> DatabaseResult<Self> {
        let connection = duckdb::Connection::open_in_memory().map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to create in-memory DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: None,
            connection: Mutex::new(connection),
        })
    }

    /// Get the database file path (None for in-memory)
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> DatabaseResult<std::sync::MutexGuard<'_, duckdb::Connection>> {
        self.connection
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))
    }

    /// Convert a DuckDB row to a JSON object keyed by column name
    fn row_to_json(row: &duckdb::Row, columns: &[String]) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (i, col_name) in columns.iter().enumerate() {
            let value = match row.get_ref(i) {
                Ok(value_ref) => Self::value_ref_to_json(value_ref),
                Err(_) => serde_json::Value::Null,
            };
            map.insert(col_name.clone(), value);
        }
        serde_json::Value::Object(map)
    }

    /// Convert a DuckDB ValueRef to a JSON value
    fn value_ref_to_json(value: duckdb::types::ValueRef) -> serde_json::Value {
        use duckdb::types::ValueRef;

        match value {
            ValueRef::Null => serde_json::Value::Null,
            ValueRef::Boolean(b) => serde_json::Value::Bool(b),
            ValueRef::TinyInt(i) => i.into(),
            ValueRef::SmallInt(i) => i.into(),
            ValueRef::Int(i) => i.into(),
            ValueRef::BigInt(i) => i.into(),
            ValueRef::UTinyInt(i) => i.into(),
            ValueRef::USmallInt(i) => i.into(),
            ValueRef::UInt(i) => i.into(),
            ValueRef::UBigInt(i) => i.into(),
            ValueRef::HugeInt(i) => serde_json::Value::String(i.to_string()),
            ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueRef::Double(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned().into(),
            ValueRef::Decimal(d) => serde_json::Value::String(d.to_string()),
            other => serde_json::Value::String(format!("{:?}", other)),
        }
    }
}

#[async_trait(?Send)]
impl DatabaseBackend for DuckDBBackend {
    async fn initialize(&self, destinations: &DestinationTables) -> DatabaseResult<()> {
        let conn = self.lock()?;
        for destination in Destination::ALL {
            let name = destinations.name_of(destination);
            let sql = DatabaseSchema::create_destination_sql(name, destination)?;
            conn.execute_batch(&sql).map_err(|e| {
                DatabaseError::MigrationFailed(format!("Failed to create {}: {}", name, e))
            })?;
            debug!("Destination {} ready", name);
        }
        Ok(())
    }

    async fn replace_rows(
        &self,
        table_name: &str,
        destination: Destination,
        rows: &[Vec<Option<String>>],
    ) -> DatabaseResult<usize> {
        let width = destination.column_names().len();
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(DatabaseError::InvalidInput(format!(
                "Row has {} values, {} expects {}",
                bad.len(),
                table_name,
                width
            )));
        }

        let clear_sql = DatabaseSchema::clear_destination_sql(table_name)?;
        let insert_sql = DatabaseSchema::insert_sql(table_name, destination)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| {
            DatabaseError::TransactionFailed(format!("Failed to begin transaction: {}", e))
        })?;

        tx.execute(&clear_sql, [])
            .map_err(|e| DatabaseError::WriteFailed(format!("Failed to clear {}: {}", table_name, e)))?;

        {
            let mut stmt = tx.prepare(&insert_sql).map_err(|e| {
                DatabaseError::WriteFailed(format!("Prepare failed for {}: {}", table_name, e))
            })?;
            for row in rows {
                stmt.execute(duckdb::params_from_iter(row.iter()))
                    .map_err(|e| {
                        DatabaseError::WriteFailed(format!(
                            "Insert into {} failed: {}",
                            table_name, e
                        ))
                    })?;
            }
        }

        tx.commit().map_err(|e| {
            DatabaseError::TransactionFailed(format!("Failed to commit {}: {}", table_name, e))
        })?;

        Ok(rows.len())
    }

    async fn execute_query(&self, sql: &str) -> DatabaseResult<QueryResult> {
        let start = std::time::Instant::now();
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;

        // In DuckDB 1.4+, the query must run before column names are known
        let mut result_rows = stmt
            .query([])
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;

        let column_count = result_rows.as_ref().map(|r| r.column_count()).unwrap_or(0);
        let columns: Vec<String> = (0..column_count)
            .map(|i| {
                result_rows
                    .as_ref()
                    .and_then(|r| r.column_name(i).ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("col{}", i))
            })
            .collect();

        let mut rows = Vec::new();
        while let Some(row) = result_rows
            .next()
            .map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))?
        {
            rows.push(Self::row_to_json(row, &columns));
        }

        Ok(QueryResult {
            columns,
            rows,
            execution_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        let conn = self.lock()?;
        conn.execute_batch("SELECT 1")
            .map(|_| true)
            .map_err(|e| DatabaseError::QueryFailed(format!("Health check failed: {}", e)))
    }

    fn backend_type(&self) -> &'static str {
        "duckdb"
    }
}
