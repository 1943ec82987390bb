//! CLI command implementations

pub mod init;
pub mod query;
pub mod run;

use clap::ValueEnum;

/// Output format for reports and query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}
