//! Raw description output returned by the metastore
//!
//! These are the shapes produced by the two per-table queries before any
//! classification happens:
//! - `DESCRIBE TABLE EXTENDED` yields an ordered list of [`DescriptionRow`]
//! - `DESCRIBE DETAIL` yields a single [`DetailAttributes`] record

use serde::{Deserialize, Serialize};

/// One `(col_name, data_type, comment)` triple from an extended description
///
/// The name field carries a column name, a section marker such as
/// `# Partition Information`, or a property key, depending on where the row
/// sits in the output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DescriptionRow {
    /// `col_name` field
    pub name: String,
    /// `data_type` field (the property value for detail rows)
    #[serde(default)]
    pub value: Option<String>,
    /// `comment` field
    #[serde(default)]
    pub comment: Option<String>,
}

impl DescriptionRow {
    /// Create a new description row
    pub fn new(name: impl Into<String>, value: Option<&str>, comment: Option<&str>) -> Self {
        Self {
            name: name.into(),
            value: value.map(str::to_string),
            comment: comment.map(str::to_string),
        }
    }

    /// Shorthand for a `(name, value, NULL)` row
    pub fn pair(name: impl Into<String>, value: &str) -> Self {
        Self::new(name, Some(value), None)
    }

    /// Shorthand for a row carrying only a name, as marker rows do
    pub fn marker(name: impl Into<String>) -> Self {
        Self::new(name, None, None)
    }
}

/// Summary attributes from `DESCRIBE DETAIL`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetailAttributes {
    /// Partition column names, in declaration order
    #[serde(default, rename = "partitionColumns")]
    pub partition_columns: Vec<String>,
    /// Number of data files backing the table
    #[serde(default, rename = "numFiles")]
    pub num_files: Option<i64>,
    /// Total size of the data files
    #[serde(default, rename = "sizeInBytes")]
    pub size_in_bytes: Option<i64>,
}

impl DetailAttributes {
    /// Create detail attributes with all three values known
    pub fn new(partition_columns: Vec<String>, num_files: i64, size_in_bytes: i64) -> Self {
        Self {
            partition_columns,
            num_files: Some(num_files),
            size_in_bytes: Some(size_in_bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_constructors() {
        let row = DescriptionRow::new("id", Some("int"), Some("primary id"));
        assert_eq!(row.name, "id");
        assert_eq!(row.value.as_deref(), Some("int"));
        assert_eq!(row.comment.as_deref(), Some("primary id"));

        let marker = DescriptionRow::marker("# col_name");
        assert!(marker.value.is_none());
        assert!(marker.comment.is_none());
    }

    #[test]
    fn test_detail_attributes_yaml_names() {
        let yaml = r#"
partitionColumns: [year, month]
numFiles: 12
sizeInBytes: 4096
"#;
        let detail: DetailAttributes = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(detail.partition_columns, vec!["year", "month"]);
        assert_eq!(detail.num_files, Some(12));
        assert_eq!(detail.size_in_bytes, Some(4096));
    }

    #[test]
    fn test_detail_attributes_missing_fields_default() {
        let detail: DetailAttributes = serde_yaml::from_str("numFiles: 1").unwrap();
        assert!(detail.partition_columns.is_empty());
        assert!(detail.size_in_bytes.is_none());
    }
}
