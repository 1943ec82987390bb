//! Catalog run command
//!
//! Loads the configuration, applies command line overrides, collects the
//! metadata of every selected table and publishes it to the DuckDB output.

use std::path::PathBuf;
use tracing::info;

use super::OutputFormat;
use crate::cli::error::CliError;
use crate::cli::runtime;
use crate::config::{CatalogConfig, SourceKind};
use crate::database::{DuckDBBackend, SyncEngine};
use crate::logging::{LogConfig, init_logging};
use crate::metastore::{DatabaseSelection, MetastoreClient, SnapshotMetastore};
use crate::pipeline::{CatalogRunner, RunReport};

/// Run command arguments
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Configuration file
    pub config: PathBuf,
    /// `|`-delimited database list, overrides the configuration
    pub db_list: Option<String>,
    /// Snapshot file; selects the snapshot source
    pub snapshot: Option<PathBuf>,
    /// DuckDB output path, overrides the configuration
    pub database: Option<PathBuf>,
    pub format: OutputFormat,
    /// Collect and report without writing the destinations
    pub dry_run: bool,
}

impl RunArgs {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply_to(&self, config: &mut CatalogConfig) {
        if let Some(list) = &self.db_list {
            config.source.db_list = Some(list.clone());
        }
        if let Some(snapshot) = &self.snapshot {
            config.source.kind = SourceKind::Snapshot;
            config.source.snapshot = Some(snapshot.display().to_string());
        }
        if let Some(database) = &self.database {
            config.database.path = database.display().to_string();
        }
    }
}

/// Run the catalog and print the report
///
/// Returns the report so the caller can decide on the exit code.
pub fn handle_run(args: &RunArgs) -> Result<RunReport, CliError> {
    let mut config = CatalogConfig::load(&args.config)?;
    args.apply_to(&mut config);
    init_logging(&LogConfig::from(&config.logging));

    let selection = DatabaseSelection::parse(config.source.db_list.as_deref());
    let rt = runtime()?;

    let report = rt.block_on(async {
        match config.source.kind {
            SourceKind::Snapshot => {
                let metastore = SnapshotMetastore::load(&config.snapshot_path()?)?;
                execute(metastore, selection, &config, args.dry_run).await
            }
            SourceKind::Databricks => {
                #[cfg(feature = "databricks")]
                {
                    use crate::metastore::DatabricksMetastore;

                    let metastore = DatabricksMetastore::new(config.databricks_config()?)?;
                    execute(metastore, selection, &config, args.dry_run).await
                }
                #[cfg(not(feature = "databricks"))]
                {
                    Err(CliError::InvalidArgument(
                        "Databricks support not enabled. Build with --features databricks"
                            .to_string(),
                    ))
                }
            }
        }
    })?;

    let output = match args.format {
        OutputFormat::Text => report.to_text(),
        OutputFormat::Json => report
            .to_json()
            .map_err(|e| CliError::IoError(format!("Failed to serialize report: {}", e)))?,
    };
    println!("{}", output);

    Ok(report)
}

async fn execute<M: MetastoreClient>(
    metastore: M,
    selection: DatabaseSelection,
    config: &CatalogConfig,
    dry_run: bool,
) -> Result<RunReport, CliError> {
    // Open the output first so a broken destination fails before the scan
    let engine = if dry_run {
        None
    } else {
        let db_path = config.duckdb_path();
        let engine = SyncEngine::new(DuckDBBackend::new(&db_path)?);
        engine.initialize(&config.destinations).await?;
        info!("Writing to {}", db_path.display());
        Some(engine)
    };

    let runner = CatalogRunner::new(metastore, selection);
    let mut run = runner.run().await?;

    match engine {
        Some(engine) => run.publish(&engine, &config.destinations).await,
        None => info!("Dry run, destinations left untouched"),
    }

    Ok(run.report)
}
