//! Catalog to database sync logic
//!
//! Writes the aggregated catalog rows into the four destination tables.
//! Each destination is written on its own: a failure on one destination is
//! recorded in the [`SyncResult`] and the remaining destinations are still
//! attempted.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::schema::{Destination, DestinationTables};
use super::{DatabaseBackend, DatabaseResult};
use crate::pipeline::CatalogRows;

/// Outcome of writing one destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub destination: Destination,
    /// Configured table name the rows went to
    pub table_name: String,
    /// Rows written (0 when the write failed)
    pub rows_written: usize,
    /// Error message when the write failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a sync operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncResult {
    /// One outcome per destination, in write order
    pub writes: Vec<WriteOutcome>,
    /// Duration of sync in milliseconds
    pub duration_ms: u64,
}

impl SyncResult {
    /// Check if sync was successful (no failed destination)
    pub fn is_success(&self) -> bool {
        self.writes.iter().all(WriteOutcome::is_success)
    }

    /// Get total rows written across destinations
    pub fn total_written(&self) -> usize {
        self.writes.iter().map(|w| w.rows_written).sum()
    }

    /// Error messages of the failed destinations
    pub fn errors(&self) -> Vec<String> {
        self.writes
            .iter()
            .filter_map(|w| {
                w.error
                    .as_ref()
                    .map(|e| format!("{} ({}): {}", w.destination, w.table_name, e))
            })
            .collect()
    }
}

/// Sync engine for catalog to database synchronization
pub struct SyncEngine<B: DatabaseBackend> {
    backend: B,
}

impl<B: DatabaseBackend> SyncEngine<B> {
    /// Create a new sync engine with the given database backend
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get reference to the database backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create the destination tables when missing
    pub async fn initialize(&self, destinations: &DestinationTables) -> DatabaseResult<()> {
        self.backend.initialize(destinations).await
    }

    /// Replace every destination with the aggregated catalog rows
    ///
    /// Destinations are written in [`Destination::ALL`] order. A failed write
    /// never prevents the following ones.
    pub async fn sync_catalog(
        &self,
        catalog: &CatalogRows,
        destinations: &DestinationTables,
    ) -> SyncResult {
        let start = std::time::Instant::now();
        let mut result = SyncResult::default();

        for destination in Destination::ALL {
            let table_name = destinations.name_of(destination).to_string();
            let rows = catalog.rows_for(destination);

            let outcome = match self
                .backend
                .replace_rows(&table_name, destination, &rows)
                .await
            {
                Ok(written) => {
                    info!("Wrote {} rows to {}", written, table_name);
                    WriteOutcome {
                        destination,
                        table_name,
                        rows_written: written,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("Failed to write {}: {}", table_name, e);
                    WriteOutcome {
                        destination,
                        table_name,
                        rows_written: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            result.writes.push(outcome);
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }
}
