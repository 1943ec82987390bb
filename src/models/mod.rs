//! Models module
//!
//! Defines the raw description shapes read from the metastore, the
//! classified per-table metadata, and the destination row shapes.

pub mod description;
pub mod rows;
pub mod table;

pub use description::{DescriptionRow, DetailAttributes};
pub use rows::{ColumnRow, DestinationRow, PartitionRow, PropertyRow, TableRow};
pub use table::{
    ClassifiedTableMetadata, ColumnDefinition, PartitionColumn, PropertyValue, TableProperty,
    TableRef,
};
