//! Flattening of per-table outcomes into destination rows

use serde::{Deserialize, Serialize};

use super::TableOutcome;
use crate::database::Destination;
use crate::models::{ColumnRow, DestinationRow, PartitionRow, PropertyRow, TableRow};

/// Rows for the four destination tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRows {
    pub tables: Vec<TableRow>,
    pub columns: Vec<ColumnRow>,
    pub partitions: Vec<PartitionRow>,
    pub properties: Vec<PropertyRow>,
}

impl CatalogRows {
    /// Aggregate outcomes in processing order
    ///
    /// Every outcome yields one identity row. Failed tables yield nothing else.
    pub fn from_outcomes(outcomes: &[TableOutcome]) -> Self {
        let mut rows = Self::default();
        for outcome in outcomes {
            rows.push(outcome);
        }
        rows
    }

    /// Append the rows of one table
    pub fn push(&mut self, outcome: &TableOutcome) {
        let table = &outcome.table;
        self.tables.push(TableRow::from(table));

        let Some(metadata) = &outcome.metadata else {
            return;
        };

        self.columns.extend(
            metadata
                .columns
                .iter()
                .map(|column| ColumnRow::from_column(table, column)),
        );
        if let Some(partitions) = &metadata.partition_columns {
            self.partitions.extend(
                partitions
                    .iter()
                    .map(|partition| PartitionRow::from_partition(table, partition)),
            );
        }
        self.properties.extend(
            metadata
                .properties
                .iter()
                .map(|property| PropertyRow::from_property(table, property)),
        );
    }

    /// Rows of one destination as nullable text values in column order
    pub fn rows_for(&self, destination: Destination) -> Vec<Vec<Option<String>>> {
        match destination {
            Destination::Tables => values(&self.tables),
            Destination::Columns => values(&self.columns),
            Destination::Partitions => values(&self.partitions),
            Destination::Properties => values(&self.properties),
        }
    }

    /// Number of rows for one destination
    pub fn count(&self, destination: Destination) -> usize {
        match destination {
            Destination::Tables => self.tables.len(),
            Destination::Columns => self.columns.len(),
            Destination::Partitions => self.partitions.len(),
            Destination::Properties => self.properties.len(),
        }
    }
}

fn values<R: DestinationRow>(rows: &[R]) -> Vec<Vec<Option<String>>> {
    rows.iter().map(DestinationRow::values).collect()
}
