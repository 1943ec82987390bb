//! Destination row shapes
//!
//! One struct per destination table. Field names match the destination
//! column names.

use serde::{Deserialize, Serialize};

use super::table::{ColumnDefinition, PartitionColumn, TableProperty, TableRef};

/// Row of the table identity destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableRow {
    pub db_name: String,
    pub table_name: String,
    pub table_name_fully_qualified: String,
}

/// Row of the column destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnRow {
    pub db_name: String,
    pub table_name: String,
    pub column_name: String,
    pub column_type: Option<String>,
    pub column_comment: Option<String>,
}

/// Row of the partition destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionRow {
    pub db_name: String,
    pub table_name: String,
    pub partition_column_name: String,
    pub partition_column_type: Option<String>,
}

/// Row of the property destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyRow {
    pub db_name: String,
    pub table_name: String,
    pub property_name: String,
    pub property_value: Option<String>,
}

impl TableRow {
    pub fn new(db_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        let db_name = db_name.into();
        let table_name = table_name.into();
        Self {
            table_name_fully_qualified: format!("{}.{}", db_name, table_name),
            db_name,
            table_name,
        }
    }
}

impl From<&TableRef> for TableRow {
    fn from(table: &TableRef) -> Self {
        Self::new(table.database.as_str(), table.table.as_str())
    }
}

impl ColumnRow {
    pub fn from_column(table: &TableRef, column: &ColumnDefinition) -> Self {
        Self {
            db_name: table.database.clone(),
            table_name: table.table.clone(),
            column_name: column.name.clone(),
            column_type: column.data_type.clone(),
            column_comment: column.comment.clone(),
        }
    }
}

impl PartitionRow {
    pub fn from_partition(table: &TableRef, partition: &PartitionColumn) -> Self {
        Self {
            db_name: table.database.clone(),
            table_name: table.table.clone(),
            partition_column_name: partition.name.clone(),
            partition_column_type: partition.data_type.clone(),
        }
    }
}

impl PropertyRow {
    pub fn from_property(table: &TableRef, property: &TableProperty) -> Self {
        Self {
            db_name: table.database.clone(),
            table_name: table.table.clone(),
            property_name: property.key.clone(),
            property_value: property.value.render(),
        }
    }
}

/// Any destination row, flattened to nullable text values in column order
pub trait DestinationRow {
    /// Values in destination column order
    fn values(&self) -> Vec<Option<String>>;
}

impl DestinationRow for TableRow {
    fn values(&self) -> Vec<Option<String>> {
        vec![
            Some(self.db_name.clone()),
            Some(self.table_name.clone()),
            Some(self.table_name_fully_qualified.clone()),
        ]
    }
}

impl DestinationRow for ColumnRow {
    fn values(&self) -> Vec<Option<String>> {
        vec![
            Some(self.db_name.clone()),
            Some(self.table_name.clone()),
            Some(self.column_name.clone()),
            self.column_type.clone(),
            self.column_comment.clone(),
        ]
    }
}

impl DestinationRow for PartitionRow {
    fn values(&self) -> Vec<Option<String>> {
        vec![
            Some(self.db_name.clone()),
            Some(self.table_name.clone()),
            Some(self.partition_column_name.clone()),
            self.partition_column_type.clone(),
        ]
    }
}

impl DestinationRow for PropertyRow {
    fn values(&self) -> Vec<Option<String>> {
        vec![
            Some(self.db_name.clone()),
            Some(self.table_name.clone()),
            Some(self.property_name.clone()),
            self.property_value.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyValue;

    #[test]
    fn test_table_row_qualifies_name() {
        let row = TableRow::new("sales", "orders");
        assert_eq!(row.table_name_fully_qualified, "sales.orders");
        assert_eq!(
            row.values(),
            vec![
                Some("sales".to_string()),
                Some("orders".to_string()),
                Some("sales.orders".to_string())
            ]
        );
    }

    #[test]
    fn test_property_row_renders_value() {
        let table = TableRef::new("sales", "orders");
        let row = PropertyRow::from_property(
            &table,
            &TableProperty::new(
                "partitionColumns",
                PropertyValue::List(vec!["year".to_string()]),
            ),
        );
        assert_eq!(row.property_value.as_deref(), Some(r#"["year"]"#));

        let null = PropertyRow::from_property(
            &table,
            &TableProperty::new("numFiles", PropertyValue::Integer(None)),
        );
        assert_eq!(null.values()[3], None);
    }
}
