//! Classified table metadata
//!
//! The result of splitting an extended description into its column,
//! partition and property sections.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully qualified reference to a table in the metastore
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    /// Database (schema) name
    pub database: String,
    /// Table name within the database
    pub table: String,
}

impl TableRef {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }

    /// `database.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// A regular column of the table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: Option<String>,
    pub comment: Option<String>,
}

/// A partition key column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionColumn {
    pub name: String,
    pub data_type: Option<String>,
}

/// Value of a table property
///
/// Detailed-table-information rows always carry text. The synthetic
/// properties merged from `DESCRIBE DETAIL` keep their native shape until
/// they are rendered for the destination table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// Text value from the description output (may be NULL)
    Text(Option<String>),
    /// List value, e.g. `partitionColumns`
    List(Vec<String>),
    /// Integer value, e.g. `numFiles`
    Integer(Option<i64>),
}

impl PropertyValue {
    /// Render the value for a string-typed destination column
    ///
    /// Lists are rendered as JSON arrays; NULL stays NULL.
    pub fn render(&self) -> Option<String> {
        match self {
            PropertyValue::Text(value) => value.clone(),
            PropertyValue::Integer(value) => value.map(|n| n.to_string()),
            PropertyValue::List(values) => {
                Some(serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string()))
            }
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Some(value) => write!(f, "{}", value),
            None => write!(f, "NULL"),
        }
    }
}

/// A `(key, value)` table property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableProperty {
    pub key: String,
    pub value: PropertyValue,
}

impl TableProperty {
    pub fn new(key: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Classified metadata for one table
///
/// Built once per table by the classifier and consumed by the aggregator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifiedTableMetadata {
    /// Regular columns in declaration order
    pub columns: Vec<ColumnDefinition>,
    /// Partition columns, present only when the description had a partition section
    pub partition_columns: Option<Vec<PartitionColumn>>,
    /// Detailed table information followed by merged detail attributes
    pub properties: Vec<TableProperty>,
}

impl ClassifiedTableMetadata {
    /// Whether the table declared a partition section
    pub fn is_partitioned(&self) -> bool {
        self.partition_columns.is_some()
    }

    /// Look up the first property with the given key
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| &p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        let table = TableRef::new("sales", "orders");
        assert_eq!(table.qualified_name(), "sales.orders");
        assert_eq!(table.to_string(), "sales.orders");
    }

    #[test]
    fn test_render_property_values() {
        assert_eq!(
            PropertyValue::Text(Some("delta".to_string())).render(),
            Some("delta".to_string())
        );
        assert_eq!(PropertyValue::Text(None).render(), None);
        assert_eq!(
            PropertyValue::Integer(Some(1024)).render(),
            Some("1024".to_string())
        );
        assert_eq!(PropertyValue::Integer(None).render(), None);
        assert_eq!(
            PropertyValue::List(vec!["year".to_string(), "month".to_string()]).render(),
            Some(r#"["year","month"]"#.to_string())
        );
        assert_eq!(PropertyValue::List(Vec::new()).render(), Some("[]".to_string()));
    }

    #[test]
    fn test_property_lookup() {
        let metadata = ClassifiedTableMetadata {
            properties: vec![
                TableProperty::new("Type", PropertyValue::Text(Some("MANAGED".to_string()))),
                TableProperty::new("numFiles", PropertyValue::Integer(Some(3))),
            ],
            ..Default::default()
        };
        assert_eq!(
            metadata.property("numFiles"),
            Some(&PropertyValue::Integer(Some(3)))
        );
        assert!(metadata.property("Owner").is_none());
        assert!(!metadata.is_partitioned());
    }

    #[test]
    fn test_null_values_keep_their_kind_through_json() {
        let metadata = ClassifiedTableMetadata {
            columns: vec![],
            partition_columns: None,
            properties: vec![
                TableProperty::new("Comment", PropertyValue::Text(None)),
                TableProperty::new("numFiles", PropertyValue::Integer(None)),
                TableProperty::new("partitionColumns", PropertyValue::List(vec![])),
            ],
        };

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains(r#"{"type":"integer","value":null}"#));
        let restored: ClassifiedTableMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, metadata);
    }
}
