//! Command line interface
//!
//! The `metastore-catalog` binary parses arguments in `main.rs` and
//! dispatches to the handlers in [`commands`].

pub mod commands;
pub mod error;

pub use error::CliError;

/// Single-threaded runtime for one command
///
/// Metastore and database calls are awaited one at a time, so a current-thread
/// runtime is enough.
pub fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::IoError(format!("Failed to create runtime: {}", e)))
}
