//! Catalog run pipeline
//!
//! Drives one metadata refresh: resolve the databases, describe and classify
//! every table, aggregate the results into destination rows and publish them.
//!
//! Failures are isolated per table and per destination. They are recorded as
//! [`Failure`] entries in the [`RunReport`]; only enumerating the databases
//! can abort a run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{ClassifiedTableMetadata, TableRef};

pub mod aggregate;
pub mod report;
pub mod run;

pub use aggregate::CatalogRows;
pub use report::RunReport;
pub use run::{CatalogRun, CatalogRunner};

/// What went wrong, and how far it reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No explicit database list; every database was enumerated instead
    ConfigurationFallback,
    /// Detail query failed or returned no row; the table continued without it
    DetailQueryFailure,
    /// Listing the tables of a database failed; the database was skipped
    TableListingFailure,
    /// Extended description failed or could not be classified
    ClassificationFailure,
    /// A destination could not be written
    WriteFailure,
}

impl FailureKind {
    /// Whether the entry means metadata is missing from the output
    ///
    /// A configuration fallback or a missing detail row still produces
    /// complete rows for the table.
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            FailureKind::ConfigurationFallback | FailureKind::DetailQueryFailure
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::ConfigurationFallback => write!(f, "configuration fallback"),
            FailureKind::DetailQueryFailure => write!(f, "detail query failure"),
            FailureKind::TableListingFailure => write!(f, "table listing failure"),
            FailureKind::ClassificationFailure => write!(f, "classification failure"),
            FailureKind::WriteFailure => write!(f, "write failure"),
        }
    }
}

/// One recorded failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    /// What the failure applies to: a database, `db.table`, or a destination table
    pub scope: String,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            scope: scope.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.scope, self.message)
    }
}

/// Result of processing one table
///
/// `metadata` is `None` when the table failed classification; the table
/// still contributes its identity row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOutcome {
    pub table: TableRef,
    pub metadata: Option<ClassifiedTableMetadata>,
    /// Whether the detail query returned attributes
    pub detail_available: bool,
}

impl TableOutcome {
    pub fn classified(table: TableRef, metadata: ClassifiedTableMetadata, detail: bool) -> Self {
        Self {
            table,
            metadata: Some(metadata),
            detail_available: detail,
        }
    }

    pub fn failed(table: TableRef) -> Self {
        Self {
            table,
            metadata: None,
            detail_available: false,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.metadata.is_none()
    }
}
