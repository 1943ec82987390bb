//! Metastore catalog - publishes table metadata from a Hive-style metastore
//!
//! Provides:
//! - Metastore access (YAML snapshots, Databricks SQL warehouses)
//! - Classification of `DESCRIBE TABLE EXTENDED` output into columns,
//!   partition columns and properties
//! - Aggregation into four destination tables and publication to DuckDB
//! - A run report that records every per-table and per-destination failure

pub mod classify;
pub mod config;
pub mod database;
pub mod metastore;
pub mod models;
pub mod pipeline;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod logging;

// Re-export commonly used types
pub use classify::{ClassificationError, ClassificationResult, classify};
pub use config::{CatalogConfig, ConfigError, ConfigResult, SourceKind};
#[cfg(feature = "duckdb-backend")]
pub use database::DuckDBBackend;
pub use database::{
    DatabaseBackend, DatabaseError, DatabaseResult, Destination, DestinationTables, SyncEngine,
};
#[cfg(feature = "databricks")]
pub use metastore::{DatabricksConfig, DatabricksMetastore};
pub use metastore::{
    DatabaseSelection, MetastoreClient, MetastoreError, MetastoreResult, SnapshotMetastore,
};
pub use models::{
    ClassifiedTableMetadata, ColumnDefinition, DescriptionRow, DetailAttributes,
    PartitionColumn, PropertyValue, TableProperty, TableRef,
};
pub use pipeline::{
    CatalogRows, CatalogRun, CatalogRunner, Failure, FailureKind, RunReport, TableOutcome,
};
