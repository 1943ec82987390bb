//! CLI binary entry point for metastore-catalog

use clap::{Parser, Subcommand};
use metastore_catalog::cli::commands::OutputFormat;
use metastore_catalog::cli::commands::init::{InitArgs, handle_init};
use metastore_catalog::cli::commands::query::{QueryArgs, handle_query};
use metastore_catalog::cli::commands::run::{RunArgs, handle_run};
use metastore_catalog::config::CONFIG_FILENAME;
use std::path::PathBuf;

/// Exit code when `--strict` is set and the run recorded errors
const STRICT_FAILURE_EXIT_CODE: i32 = 2;

#[derive(Parser)]
#[command(name = "metastore-catalog")]
#[command(about = "Publish column, partition and property metadata for metastore tables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample configuration file
    Init {
        /// Configuration file to create
        #[arg(short, long, default_value = CONFIG_FILENAME)]
        config: PathBuf,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Describe every selected table and publish the destination tables
    Run {
        /// Configuration file
        #[arg(short, long, default_value = CONFIG_FILENAME)]
        config: PathBuf,
        /// Databases to catalog, separated by "|" ("None" selects all)
        #[arg(long)]
        db_list: Option<String>,
        /// Read the metastore from a YAML snapshot
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// DuckDB output database
        #[arg(short, long)]
        database: Option<PathBuf>,
        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Exit non-zero when any table, database or destination failed
        #[arg(long)]
        strict: bool,
        /// Collect and report without writing the destinations
        #[arg(long)]
        dry_run: bool,
    },

    /// Execute SQL queries against the output database
    Query {
        /// SQL query to execute
        sql: String,
        /// Configuration file
        #[arg(short, long, default_value = CONFIG_FILENAME)]
        config: PathBuf,
        /// DuckDB output database
        #[arg(short, long)]
        database: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { config, force } => handle_init(&InitArgs { config, force }).map(|_| 0),
        Commands::Run {
            config,
            db_list,
            snapshot,
            database,
            format,
            strict,
            dry_run,
        } => {
            let args = RunArgs {
                config,
                db_list,
                snapshot,
                database,
                format,
                dry_run,
            };
            handle_run(&args).map(|report| {
                if strict && report.has_errors() {
                    STRICT_FAILURE_EXIT_CODE
                } else {
                    0
                }
            })
        }
        Commands::Query {
            sql,
            config,
            database,
            format,
        } => {
            let args = QueryArgs {
                sql,
                config,
                database,
                format,
            };
            handle_query(&args).map(|_| 0)
        }
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
