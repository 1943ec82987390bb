//! YAML snapshot metastore
//!
//! Serves enumeration and description queries from a YAML document captured
//! ahead of time. Query failures can be recorded per table so a snapshot can
//! reproduce a partially broken metastore.
//!
//! ```yaml
//! databases:
//!   - name: sales
//!     tables:
//!       - name: orders
//!         extended:
//!           - [id, bigint, null]
//!           - [amount, "decimal(10,2)", gross amount]
//!           - ["", "", ""]
//!           - ["# Detailed Table Information", null, null]
//!           - [Provider, delta, null]
//!         detail:
//!           partitionColumns: []
//!           numFiles: 4
//!           sizeInBytes: 20480
//!       - name: broken
//!         extended_error: "TABLE_OR_VIEW_NOT_FOUND"
//!   - name: locked
//!     tables_error: "PERMISSION_DENIED"
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::{MetastoreClient, MetastoreError, MetastoreResult};
use crate::models::{DescriptionRow, DetailAttributes};

/// Root of a snapshot document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetastoreSnapshot {
    #[serde(default)]
    pub databases: Vec<SnapshotDatabase>,
}

/// One database in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDatabase {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<SnapshotTable>,
    /// When set, listing this database's tables fails with this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables_error: Option<String>,
}

/// One table in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotTable {
    pub name: String,
    #[serde(default)]
    pub extended: Vec<SnapshotRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailAttributes>,
    /// When set, the extended description fails with this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_error: Option<String>,
    /// When set, the detail description fails with this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_error: Option<String>,
}

/// A description row, written either as a `[name, value, comment]` triple or
/// as a map with `name`, `value` and `comment` keys
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotRow {
    Triple(String, Option<String>, Option<String>),
    Row(DescriptionRow),
}

impl From<&SnapshotRow> for DescriptionRow {
    fn from(row: &SnapshotRow) -> Self {
        match row {
            SnapshotRow::Triple(name, value, comment) => DescriptionRow {
                name: name.clone(),
                value: value.clone(),
                comment: comment.clone(),
            },
            SnapshotRow::Row(row) => row.clone(),
        }
    }
}

/// Metastore backed by an in-memory snapshot
pub struct SnapshotMetastore {
    snapshot: MetastoreSnapshot,
}

impl SnapshotMetastore {
    /// Create a metastore from an already parsed snapshot
    pub fn new(snapshot: MetastoreSnapshot) -> Self {
        Self { snapshot }
    }

    /// Parse a snapshot from YAML content
    pub fn from_yaml(content: &str) -> MetastoreResult<Self> {
        let snapshot: MetastoreSnapshot = serde_yaml::from_str(content).map_err(|e| {
            MetastoreError::SnapshotError(format!("Failed to parse snapshot: {}", e))
        })?;
        Ok(Self::new(snapshot))
    }

    /// Load a snapshot from a YAML file
    pub fn load(path: &Path) -> MetastoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MetastoreError::SnapshotError(format!(
                "Failed to read snapshot {}: {}",
                path.display(),
                e
            ))
        })?;
        debug!("Loaded snapshot from {}", path.display());
        Self::from_yaml(&content)
    }

    /// Access the underlying snapshot
    pub fn snapshot(&self) -> &MetastoreSnapshot {
        &self.snapshot
    }

    fn database(&self, database: &str) -> MetastoreResult<&SnapshotDatabase> {
        self.snapshot
            .databases
            .iter()
            .find(|db| db.name == database)
            .ok_or_else(|| MetastoreError::NotFound(format!("Database {}", database)))
    }

    fn table(&self, database: &str, table: &str) -> MetastoreResult<&SnapshotTable> {
        self.database(database)?
            .tables
            .iter()
            .find(|t| t.name == table)
            .ok_or_else(|| MetastoreError::NotFound(format!("Table {}.{}", database, table)))
    }
}

#[async_trait(?Send)]
impl MetastoreClient for SnapshotMetastore {
    async fn list_databases(&self) -> MetastoreResult<Vec<String>> {
        Ok(self
            .snapshot
            .databases
            .iter()
            .map(|db| db.name.clone())
            .collect())
    }

    async fn list_tables(&self, database: &str) -> MetastoreResult<Vec<String>> {
        let db = self.database(database)?;
        if let Some(message) = &db.tables_error {
            return Err(MetastoreError::StatementFailed(message.clone()));
        }
        Ok(db.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn describe_extended(
        &self,
        database: &str,
        table: &str,
    ) -> MetastoreResult<Vec<DescriptionRow>> {
        let entry = self.table(database, table)?;
        if let Some(message) = &entry.extended_error {
            return Err(MetastoreError::StatementFailed(message.clone()));
        }
        Ok(entry.extended.iter().map(DescriptionRow::from).collect())
    }

    async fn describe_detail(
        &self,
        database: &str,
        table: &str,
    ) -> MetastoreResult<Option<DetailAttributes>> {
        let entry = self.table(database, table)?;
        if let Some(message) = &entry.detail_error {
            return Err(MetastoreError::StatementFailed(message.clone()));
        }
        Ok(entry.detail.clone())
    }

    fn source_type(&self) -> &'static str {
        "snapshot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SNAPSHOT: &str = r##"
databases:
  - name: sales
    tables:
      - name: orders
        extended:
          - [id, bigint, null]
          - name: amount
            value: "decimal(10,2)"
            comment: gross amount
          - ["# Detailed Table Information", null, null]
          - [Provider, delta, null]
        detail:
          partitionColumns: [year]
          numFiles: 3
          sizeInBytes: 1024
      - name: broken
        extended_error: TABLE_OR_VIEW_NOT_FOUND
        detail_error: DELTA_MISSING_DELTA_TABLE
  - name: locked
    tables_error: PERMISSION_DENIED
"##;

    #[tokio::test]
    async fn test_enumeration_follows_document_order() {
        let metastore = SnapshotMetastore::from_yaml(SNAPSHOT).unwrap();
        assert_eq!(
            metastore.list_databases().await.unwrap(),
            vec!["sales", "locked"]
        );
        assert_eq!(
            metastore.list_tables("sales").await.unwrap(),
            vec!["orders", "broken"]
        );
    }

    #[tokio::test]
    async fn test_rows_accept_triples_and_maps() {
        let metastore = SnapshotMetastore::from_yaml(SNAPSHOT).unwrap();
        let rows = metastore.describe_extended("sales", "orders").await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], DescriptionRow::new("id", Some("bigint"), None));
        assert_eq!(
            rows[1],
            DescriptionRow::new("amount", Some("decimal(10,2)"), Some("gross amount"))
        );
        assert!(rows[2].value.is_none());
    }

    #[tokio::test]
    async fn test_detail_is_returned() {
        let metastore = SnapshotMetastore::from_yaml(SNAPSHOT).unwrap();
        let detail = metastore
            .describe_detail("sales", "orders")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.partition_columns, vec!["year"]);
        assert_eq!(detail.num_files, Some(3));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let metastore = SnapshotMetastore::from_yaml(SNAPSHOT).unwrap();
        assert!(matches!(
            metastore.describe_extended("sales", "broken").await,
            Err(MetastoreError::StatementFailed(_))
        ));
        assert!(matches!(
            metastore.describe_detail("sales", "broken").await,
            Err(MetastoreError::StatementFailed(_))
        ));
        assert!(matches!(
            metastore.list_tables("locked").await,
            Err(MetastoreError::StatementFailed(_))
        ));
        assert!(matches!(
            metastore.describe_extended("sales", "missing").await,
            Err(MetastoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.yaml");
        std::fs::write(&path, SNAPSHOT).unwrap();

        let metastore = SnapshotMetastore::load(&path).unwrap();
        assert_eq!(metastore.snapshot().databases.len(), 2);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            SnapshotMetastore::from_yaml("databases: [ {"),
            Err(MetastoreError::SnapshotError(_))
        ));
    }
}
