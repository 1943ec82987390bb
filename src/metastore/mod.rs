//! Metastore access
//!
//! This module abstracts the catalog service that holds database, table and
//! column definitions. The pipeline only needs four operations from it:
//! - enumerate databases
//! - enumerate the tables of a database
//! - run the extended description of a table
//! - run the detail (summary) description of a table
//!
//! Implementations:
//! - [`SnapshotMetastore`]: reads a YAML snapshot, for offline runs and tests
//! - `DatabricksMetastore`: Databricks SQL Statement Execution API (feature `databricks`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{DescriptionRow, DetailAttributes};

#[cfg(feature = "databricks")]
pub mod databricks;
pub mod snapshot;
pub mod sql;

#[cfg(feature = "databricks")]
pub use self::databricks::{DatabricksConfig, DatabricksMetastore};
pub use snapshot::SnapshotMetastore;
pub use sql::StatementBuilder;

/// Sentinel that selects every database, as passed by schedulers that
/// stringify an unset parameter
pub const ALL_DATABASES_SENTINEL: &str = "None";

/// Delimiter between database names in an explicit selection
pub const DATABASE_LIST_DELIMITER: char = '|';

/// Error type for metastore operations
#[derive(Debug, thiserror::Error)]
pub enum MetastoreError {
    /// Failed to reach the metastore
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The statement was rejected or failed server-side
    #[error("Statement failed: {0}")]
    StatementFailed(String),

    /// The statement did not finish within the poll timeout
    #[error("Statement timed out after {0} ms")]
    Timeout(u64),

    /// Database or table does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The result did not have the expected shape
    #[error("Unexpected result: {0}")]
    UnexpectedResult(String),

    /// Snapshot file could not be read or parsed
    #[error("Snapshot error: {0}")]
    SnapshotError(String),
}

/// Result type for metastore operations
pub type MetastoreResult<T> = Result<T, MetastoreError>;

/// Metastore trait for enumeration and description queries
///
/// Calls are awaited one at a time by the pipeline; implementations are not
/// required to support concurrent use.
#[async_trait(?Send)]
pub trait MetastoreClient {
    /// List every database visible to the caller, in metastore order
    async fn list_databases(&self) -> MetastoreResult<Vec<String>>;

    /// List the tables of a database (order unspecified)
    async fn list_tables(&self, database: &str) -> MetastoreResult<Vec<String>>;

    /// Run `DESCRIBE TABLE EXTENDED` and return its rows in order
    async fn describe_extended(
        &self,
        database: &str,
        table: &str,
    ) -> MetastoreResult<Vec<DescriptionRow>>;

    /// Run `DESCRIBE DETAIL` and return its first row, if any
    async fn describe_detail(
        &self,
        database: &str,
        table: &str,
    ) -> MetastoreResult<Option<DetailAttributes>>;

    /// Short name of the metastore implementation
    fn source_type(&self) -> &'static str;
}

/// Which databases a run covers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseSelection {
    /// Every database the metastore enumerates
    #[default]
    All,
    /// An explicit list, processed in the given order
    Explicit(Vec<String>),
}

impl DatabaseSelection {
    /// Parse a `|`-delimited database list
    ///
    /// `None`, an empty string and the literal `"None"` select all databases.
    /// Empty segments (`"a||b"`) are skipped.
    pub fn parse(list: Option<&str>) -> Self {
        match list {
            None => DatabaseSelection::All,
            Some(list) if list.is_empty() || list == ALL_DATABASES_SENTINEL => {
                DatabaseSelection::All
            }
            Some(list) => {
                let names: Vec<String> = list
                    .split(DATABASE_LIST_DELIMITER)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
                if names.is_empty() {
                    DatabaseSelection::All
                } else {
                    DatabaseSelection::Explicit(names)
                }
            }
        }
    }

    /// Resolve the selection to concrete database names
    pub async fn resolve<M: MetastoreClient + ?Sized>(
        &self,
        metastore: &M,
    ) -> MetastoreResult<Vec<String>> {
        match self {
            DatabaseSelection::Explicit(names) => Ok(names.clone()),
            DatabaseSelection::All => metastore.list_databases().await,
        }
    }
}
