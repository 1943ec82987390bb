//! Sequential catalog run over databases and tables

use tracing::{debug, info, warn};

use super::{CatalogRows, FailureKind, RunReport, TableOutcome};
use crate::classify::classify;
use crate::database::{DatabaseBackend, DestinationTables, SyncEngine};
use crate::metastore::{DatabaseSelection, MetastoreClient, MetastoreResult};
use crate::models::{DetailAttributes, TableRef};

/// Everything a run collected, ready to publish
#[derive(Debug, Clone)]
pub struct CatalogRun {
    pub report: RunReport,
    /// Per-table outcomes in processing order
    pub outcomes: Vec<TableOutcome>,
    pub rows: CatalogRows,
}

/// Describes and classifies every selected table
///
/// Databases are processed in selection (or enumeration) order, tables in
/// lexicographic order within each database. Calls are awaited one at a time.
pub struct CatalogRunner<M: MetastoreClient> {
    metastore: M,
    selection: DatabaseSelection,
}

impl<M: MetastoreClient> CatalogRunner<M> {
    pub fn new(metastore: M, selection: DatabaseSelection) -> Self {
        Self {
            metastore,
            selection,
        }
    }

    pub fn metastore(&self) -> &M {
        &self.metastore
    }

    pub fn selection(&self) -> &DatabaseSelection {
        &self.selection
    }

    /// Collect metadata for every selected table
    ///
    /// Fails only when the databases have to be enumerated and enumeration
    /// fails. Every other failure is recorded in the report.
    pub async fn run(&self) -> MetastoreResult<CatalogRun> {
        let mut report = RunReport::new(self.metastore.source_type());

        if self.selection == DatabaseSelection::All {
            info!("No database list given, enumerating all databases");
            report.record(
                FailureKind::ConfigurationFallback,
                "databases",
                "no database list given, enumerated all databases",
            );
        }
        let databases = self.selection.resolve(&self.metastore).await?;
        info!("Processing {} databases", databases.len());

        let mut outcomes = Vec::new();
        for database in &databases {
            let mut tables = match self.metastore.list_tables(database).await {
                Ok(tables) => tables,
                Err(e) => {
                    warn!("Skipping database {}: {}", database, e);
                    report.record(FailureKind::TableListingFailure, database.clone(), e.to_string());
                    continue;
                }
            };
            tables.sort();
            info!("Database {}: {} tables", database, tables.len());

            for table in tables {
                let table = TableRef::new(database.clone(), table);
                outcomes.push(self.describe_table(table, &mut report).await);
            }
        }

        report.databases = databases;
        report.tables_processed = outcomes.len();
        report.tables_failed = outcomes.iter().filter(|o| o.is_failed()).count();
        report.finish();

        info!(
            "Processed {} tables in {} databases ({} failed)",
            report.tables_processed,
            report.databases.len(),
            report.tables_failed
        );

        let rows = CatalogRows::from_outcomes(&outcomes);
        Ok(CatalogRun {
            report,
            outcomes,
            rows,
        })
    }

    /// Describe and classify one table
    pub async fn describe_table(&self, table: TableRef, report: &mut RunReport) -> TableOutcome {
        debug!("Describing {}", table);
        let detail = self.fetch_detail(&table, report).await;

        let raw_rows = match self
            .metastore
            .describe_extended(&table.database, &table.table)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Failed to describe {}: {}", table, e);
                report.record(
                    FailureKind::ClassificationFailure,
                    table.qualified_name(),
                    e.to_string(),
                );
                return TableOutcome::failed(table);
            }
        };

        match classify(&raw_rows, detail.as_ref()) {
            Ok(metadata) => {
                debug!(
                    "{}: {} columns, {} properties",
                    table,
                    metadata.columns.len(),
                    metadata.properties.len()
                );
                TableOutcome::classified(table, metadata, detail.is_some())
            }
            Err(e) => {
                warn!("Failed to classify {}: {}", table, e);
                report.record(
                    FailureKind::ClassificationFailure,
                    table.qualified_name(),
                    e.to_string(),
                );
                TableOutcome::failed(table)
            }
        }
    }

    async fn fetch_detail(&self, table: &TableRef, report: &mut RunReport) -> Option<DetailAttributes> {
        match self
            .metastore
            .describe_detail(&table.database, &table.table)
            .await
        {
            Ok(Some(detail)) => Some(detail),
            Ok(None) => {
                warn!("Detail query for {} returned no row", table);
                report.record(
                    FailureKind::DetailQueryFailure,
                    table.qualified_name(),
                    "detail query returned no row",
                );
                None
            }
            Err(e) => {
                warn!("Detail query for {} failed: {}", table, e);
                report.record(
                    FailureKind::DetailQueryFailure,
                    table.qualified_name(),
                    e.to_string(),
                );
                None
            }
        }
    }
}

impl CatalogRun {
    /// Replace the destination tables with the collected rows
    ///
    /// Each destination is written independently; failed writes are
    /// recorded in the report.
    pub async fn publish<B: DatabaseBackend>(
        &mut self,
        engine: &SyncEngine<B>,
        destinations: &DestinationTables,
    ) {
        let result = engine.sync_catalog(&self.rows, destinations).await;
        info!(
            "Published {} rows to {} destinations in {} ms",
            result.total_written(),
            result.writes.len(),
            result.duration_ms
        );
        self.report.record_writes(result.writes);
        self.report.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::NUM_FILES_PROPERTY;
    use crate::metastore::SnapshotMetastore;

    const SNAPSHOT: &str = r##"
databases:
  - name: sales
    tables:
      - name: returns
        extended:
          - [id, bigint, null]
          - ["", "", ""]
          - ["# Detailed Table Information", null, null]
          - [Provider, delta, null]
        detail_error: DELTA_MISSING_DELTA_TABLE
      - name: orders
        extended:
          - [id, bigint, null]
          - [year, int, null]
          - ["# Partition Information", null, null]
          - ["# col_name", data_type, comment]
          - [year, int, null]
          - ["", "", ""]
          - ["# Detailed Table Information", null, null]
          - [Provider, delta, null]
        detail:
          partitionColumns: [year]
          numFiles: 3
          sizeInBytes: 1024
      - name: broken
        extended_error: TABLE_OR_VIEW_NOT_FOUND
  - name: locked
    tables_error: PERMISSION_DENIED
  - name: hr
    tables:
      - name: people
        extended:
          - [name, string, null]
"##;

    fn runner(selection: DatabaseSelection) -> CatalogRunner<SnapshotMetastore> {
        CatalogRunner::new(SnapshotMetastore::from_yaml(SNAPSHOT).unwrap(), selection)
    }

    #[tokio::test]
    async fn test_tables_sorted_within_database() {
        let run = runner(DatabaseSelection::All).run().await.unwrap();
        let order: Vec<String> = run
            .outcomes
            .iter()
            .map(|o| o.table.qualified_name())
            .collect();
        assert_eq!(
            order,
            vec!["sales.broken", "sales.orders", "sales.returns", "hr.people"]
        );
        assert_eq!(run.report.databases, vec!["sales", "locked", "hr"]);
    }

    #[tokio::test]
    async fn test_failures_are_recorded_not_raised() {
        let run = runner(DatabaseSelection::All).run().await.unwrap();
        let report = &run.report;

        assert_eq!(report.tables_processed, 4);
        assert_eq!(report.tables_failed, 1);
        assert_eq!(report.failures_of(FailureKind::ConfigurationFallback).count(), 1);
        assert_eq!(report.failures_of(FailureKind::TableListingFailure).count(), 1);
        assert_eq!(report.failures_of(FailureKind::ClassificationFailure).count(), 1);
        // returns fails its detail query; broken and people have no detail row
        assert_eq!(report.failures_of(FailureKind::DetailQueryFailure).count(), 3);
        assert!(report.has_errors());
    }

    #[tokio::test]
    async fn test_detail_failure_keeps_table() {
        let run = runner(DatabaseSelection::Explicit(vec!["sales".to_string()]))
            .run()
            .await
            .unwrap();
        let returns = run
            .outcomes
            .iter()
            .find(|o| o.table.table == "returns")
            .unwrap();
        let metadata = returns.metadata.as_ref().unwrap();

        assert!(!returns.detail_available);
        assert_eq!(metadata.properties.len(), 1);
        assert!(metadata.property(NUM_FILES_PROPERTY).is_none());
    }

    #[tokio::test]
    async fn test_explicit_selection_skips_enumeration() {
        let run = runner(DatabaseSelection::Explicit(vec![
            "hr".to_string(),
            "missing".to_string(),
        ]))
        .run()
        .await
        .unwrap();

        assert_eq!(run.report.databases, vec!["hr", "missing"]);
        assert_eq!(run.report.failures_of(FailureKind::ConfigurationFallback).count(), 0);
        assert_eq!(run.report.failures_of(FailureKind::TableListingFailure).count(), 1);
        assert_eq!(run.outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_rows_cover_every_table() {
        let run = runner(DatabaseSelection::All).run().await.unwrap();
        assert_eq!(run.rows.tables.len(), run.outcomes.len());
        assert_eq!(run.rows.partitions.len(), 1);
        assert!(run.rows.columns.iter().all(|c| c.table_name != "broken"));
    }
}
