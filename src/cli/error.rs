//! CLI-specific error types

use crate::config::ConfigError;
use crate::database::DatabaseError;
use crate::metastore::MetastoreError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to write file {0}: {1}")]
    FileWriteError(PathBuf, String),

    #[error("File already exists: {0} (use --force to overwrite)")]
    FileExists(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Metastore error: {0}")]
    MetastoreError(#[from] MetastoreError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(String),
}
