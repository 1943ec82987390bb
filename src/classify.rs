//! Classification of extended table descriptions
//!
//! `DESCRIBE TABLE EXTENDED` returns one flat list of rows. Regular columns
//! come first, then an optional partition section, then the detailed table
//! information. Sections are introduced by marker rows whose name is a fixed
//! literal:
//!
//! ```text
//! id                              int
//! name                            string
//! # Partition Information
//! # col_name                      data_type       comment
//! year                            int
//!
//! # Detailed Table Information
//! Database                        default
//! Table                           t1
//! ```
//!
//! The classifier records the first position of each marker in a single
//! scan and slices the rows into columns, partition columns and properties.
//! The row immediately before the detail marker is a separator and belongs
//! to no section.

use thiserror::Error;

use crate::models::{
    ClassifiedTableMetadata, ColumnDefinition, DescriptionRow, DetailAttributes, PartitionColumn,
    PropertyValue, TableProperty,
};

/// Header row of the partition column listing
pub const COLUMN_HEADER_MARKER: &str = "# col_name";

/// Start of the partition section
pub const PARTITION_INFORMATION_MARKER: &str = "# Partition Information";

/// Start of the detailed table information section
pub const DETAILED_TABLE_INFORMATION_MARKER: &str = "# Detailed Table Information";

/// Synthetic property holding the partition columns reported by `DESCRIBE DETAIL`
pub const PARTITION_COLUMNS_PROPERTY: &str = "partitionColumns";

/// Synthetic property holding the file count reported by `DESCRIBE DETAIL`
pub const NUM_FILES_PROPERTY: &str = "numFiles";

/// Synthetic property holding the table size reported by `DESCRIBE DETAIL`
pub const SIZE_IN_BYTES_PROPERTY: &str = "sizeInBytes";

/// Errors raised while classifying a description
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassificationError {
    /// Name projection and row projection disagree in length
    #[error("Row count mismatch: {names} names for {rows} rows")]
    RowCountMismatch { names: usize, rows: usize },

    /// Marker positions produced a slice bound outside the rows
    #[error("Invalid slice [{start}, {end}) over {len} rows: {reason}")]
    InvalidSlice {
        start: i64,
        end: i64,
        len: usize,
        reason: &'static str,
    },
}

/// Result type for classification
pub type ClassificationResult<T> = Result<T, ClassificationError>;

/// First position of every marker literal in a description
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerPositions {
    pub column_header: Option<usize>,
    pub partition_information: Option<usize>,
    pub detailed_information: Option<usize>,
}

impl MarkerPositions {
    /// Scan row names once, keeping the first occurrence of each marker
    pub fn scan<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut positions = Self::default();
        for (index, name) in names.into_iter().enumerate() {
            let slot = match name {
                COLUMN_HEADER_MARKER => &mut positions.column_header,
                PARTITION_INFORMATION_MARKER => &mut positions.partition_information,
                DETAILED_TABLE_INFORMATION_MARKER => &mut positions.detailed_information,
                _ => continue,
            };
            slot.get_or_insert(index);
        }
        positions
    }
}

/// Split an extended description into columns, partition columns and properties
///
/// When `detail` is present and the description has a detailed table
/// information section, the three detail attributes are appended to the
/// properties as `partitionColumns`, `numFiles` and `sizeInBytes`.
///
/// Without the detail marker every row is returned as a column, there are
/// no partition columns, no properties, and `detail` is ignored.
pub fn classify(
    raw_rows: &[DescriptionRow],
    detail: Option<&DetailAttributes>,
) -> ClassificationResult<ClassifiedTableMetadata> {
    let names: Vec<&str> = raw_rows.iter().map(|row| row.name.as_str()).collect();
    if names.len() != raw_rows.len() {
        return Err(ClassificationError::RowCountMismatch {
            names: names.len(),
            rows: raw_rows.len(),
        });
    }

    let markers = MarkerPositions::scan(names.iter().copied());

    let Some(meta_index) = markers.detailed_information else {
        return Ok(ClassifiedTableMetadata {
            columns: raw_rows.iter().map(column_definition).collect(),
            partition_columns: None,
            properties: Vec::new(),
        });
    };

    let mut properties: Vec<TableProperty> =
        slice(raw_rows, meta_index as i64 + 1, raw_rows.len() as i64)?
            .iter()
            .map(table_property)
            .collect();

    // The row just before the detail marker is a separator.
    let separator = meta_index as i64 - 1;

    let (columns, partition_columns) =
        match (markers.partition_information, markers.column_header) {
            (Some(part_info_index), Some(col_name_index)) => {
                let partitions = slice(raw_rows, col_name_index as i64 + 1, separator)?
                    .iter()
                    .map(partition_column)
                    .collect();
                let columns = slice(raw_rows, 0, part_info_index as i64)?;
                (columns, Some(partitions))
            }
            _ => (slice(raw_rows, 0, separator)?, None),
        };

    if let Some(detail) = detail {
        properties.extend(detail_properties(detail));
    }

    Ok(ClassifiedTableMetadata {
        columns: columns.iter().map(column_definition).collect(),
        partition_columns,
        properties,
    })
}

/// Synthetic properties for the detail attributes, in merge order
pub fn detail_properties(detail: &DetailAttributes) -> [TableProperty; 3] {
    [
        TableProperty::new(
            PARTITION_COLUMNS_PROPERTY,
            PropertyValue::List(detail.partition_columns.clone()),
        ),
        TableProperty::new(NUM_FILES_PROPERTY, PropertyValue::Integer(detail.num_files)),
        TableProperty::new(
            SIZE_IN_BYTES_PROPERTY,
            PropertyValue::Integer(detail.size_in_bytes),
        ),
    ]
}

/// Half-open slice `[start, end)`
///
/// A negative bound or a bound past the end is an error. An inverted range
/// is empty.
fn slice(
    rows: &[DescriptionRow],
    start: i64,
    end: i64,
) -> ClassificationResult<&[DescriptionRow]> {
    let invalid = |reason| ClassificationError::InvalidSlice {
        start,
        end,
        len: rows.len(),
        reason,
    };

    if start < 0 || end < 0 {
        return Err(invalid("negative bound"));
    }
    if start as usize > rows.len() || end as usize > rows.len() {
        return Err(invalid("bound past end of rows"));
    }
    if start >= end {
        return Ok(&[]);
    }
    Ok(&rows[start as usize..end as usize])
}

fn column_definition(row: &DescriptionRow) -> ColumnDefinition {
    ColumnDefinition {
        name: row.name.clone(),
        data_type: row.value.clone(),
        comment: row.comment.clone(),
    }
}

fn partition_column(row: &DescriptionRow) -> PartitionColumn {
    PartitionColumn {
        name: row.name.clone(),
        data_type: row.value.clone(),
    }
}

fn table_property(row: &DescriptionRow) -> TableProperty {
    TableProperty::new(row.name.clone(), PropertyValue::Text(row.value.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, value: &str) -> DescriptionRow {
        DescriptionRow::pair(name, value)
    }

    fn blank() -> DescriptionRow {
        DescriptionRow::new("", Some(""), Some(""))
    }

    /// Layout produced for a partitioned table
    fn partitioned_description() -> Vec<DescriptionRow> {
        vec![
            DescriptionRow::new("id", Some("bigint"), Some("surrogate key")),
            row("amount", "decimal(10,2)"),
            row("year", "int"),
            row("month", "int"),
            DescriptionRow::marker(PARTITION_INFORMATION_MARKER),
            DescriptionRow::new(COLUMN_HEADER_MARKER, Some("data_type"), Some("comment")),
            row("year", "int"),
            row("month", "int"),
            blank(),
            DescriptionRow::marker(DETAILED_TABLE_INFORMATION_MARKER),
            row("Catalog", "spark_catalog"),
            row("Database", "sales"),
            row("Table", "orders"),
            row("Type", "MANAGED"),
            row("Provider", "delta"),
        ]
    }

    /// Layout produced for an unpartitioned table
    fn flat_description() -> Vec<DescriptionRow> {
        vec![
            row("id", "bigint"),
            row("name", "string"),
            blank(),
            DescriptionRow::marker(DETAILED_TABLE_INFORMATION_MARKER),
            row("Database", "default"),
            row("Table", "people"),
        ]
    }

    fn detail() -> DetailAttributes {
        DetailAttributes::new(vec!["year".to_string(), "month".to_string()], 3, 1024)
    }

    #[test]
    fn test_scan_keeps_first_marker_occurrence() {
        let names = ["a", COLUMN_HEADER_MARKER, "b", COLUMN_HEADER_MARKER];
        let markers = MarkerPositions::scan(names);
        assert_eq!(markers.column_header, Some(1));
        assert_eq!(markers.partition_information, None);
        assert_eq!(markers.detailed_information, None);
    }

    #[test]
    fn test_partitioned_table() {
        let metadata = classify(&partitioned_description(), None).unwrap();

        let columns: Vec<&str> = metadata.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(columns, vec!["id", "amount", "year", "month"]);
        assert_eq!(
            metadata.columns[0].comment.as_deref(),
            Some("surrogate key")
        );

        let partitions = metadata.partition_columns.unwrap();
        assert_eq!(
            partitions,
            vec![
                PartitionColumn {
                    name: "year".to_string(),
                    data_type: Some("int".to_string()),
                },
                PartitionColumn {
                    name: "month".to_string(),
                    data_type: Some("int".to_string()),
                },
            ]
        );

        let keys: Vec<&str> = metadata.properties.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["Catalog", "Database", "Table", "Type", "Provider"]);
    }

    #[test]
    fn test_flat_table_drops_separator() {
        let metadata = classify(&flat_description(), None).unwrap();
        let columns: Vec<&str> = metadata.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(columns, vec!["id", "name"]);
        assert!(metadata.partition_columns.is_none());
        assert_eq!(metadata.properties.len(), 2);
    }

    #[test]
    fn test_detail_attributes_appended_after_natural_properties() {
        let metadata = classify(&partitioned_description(), Some(&detail())).unwrap();
        let tail: Vec<&TableProperty> = metadata.properties.iter().rev().take(3).rev().collect();

        assert_eq!(tail[0].key, PARTITION_COLUMNS_PROPERTY);
        assert_eq!(
            tail[0].value,
            PropertyValue::List(vec!["year".to_string(), "month".to_string()])
        );
        assert_eq!(tail[1].key, NUM_FILES_PROPERTY);
        assert_eq!(tail[1].value, PropertyValue::Integer(Some(3)));
        assert_eq!(tail[2].key, SIZE_IN_BYTES_PROPERTY);
        assert_eq!(tail[2].value, PropertyValue::Integer(Some(1024)));
        assert_eq!(metadata.properties.len(), 8);
    }

    #[test]
    fn test_missing_detail_marker_keeps_every_row_as_column() {
        let rows = vec![row("id", "int"), row("name", "string"), blank()];
        let metadata = classify(&rows, Some(&detail())).unwrap();

        assert_eq!(metadata.columns.len(), rows.len());
        assert_eq!(metadata.columns[2].name, "");
        assert!(metadata.partition_columns.is_none());
        assert!(metadata.properties.is_empty());
    }

    #[test]
    fn test_empty_description() {
        let metadata = classify(&[], Some(&detail())).unwrap();
        assert_eq!(metadata, ClassifiedTableMetadata::default());
    }

    #[test]
    fn test_detail_marker_first_is_invalid_slice() {
        let rows = vec![
            DescriptionRow::marker(DETAILED_TABLE_INFORMATION_MARKER),
            row("Database", "default"),
        ];
        let err = classify(&rows, None).unwrap_err();
        assert!(matches!(
            err,
            ClassificationError::InvalidSlice { end: -1, .. }
        ));
    }

    #[test]
    fn test_partition_markers_without_rows_between() {
        // Header directly followed by the separator: nothing in between.
        let rows = vec![
            row("id", "int"),
            DescriptionRow::marker(PARTITION_INFORMATION_MARKER),
            DescriptionRow::marker(COLUMN_HEADER_MARKER),
            blank(),
            DescriptionRow::marker(DETAILED_TABLE_INFORMATION_MARKER),
        ];
        let metadata = classify(&rows, None).unwrap();
        assert_eq!(metadata.partition_columns, Some(Vec::new()));
        assert_eq!(metadata.columns.len(), 1);
        assert!(metadata.properties.is_empty());
    }

    #[test]
    fn test_single_partition_marker_is_ignored() {
        let rows = vec![
            row("id", "int"),
            DescriptionRow::marker(PARTITION_INFORMATION_MARKER),
            blank(),
            DescriptionRow::marker(DETAILED_TABLE_INFORMATION_MARKER),
            row("Table", "t"),
        ];
        let metadata = classify(&rows, None).unwrap();
        assert!(metadata.partition_columns.is_none());
        let columns: Vec<&str> = metadata.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(columns, vec!["id", PARTITION_INFORMATION_MARKER]);
    }

    #[test]
    fn test_header_before_partition_marker_uses_exact_bounds() {
        // Header row ahead of the partition marker: columns still end at the
        // partition marker, partitions run from the header to the separator.
        let rows = vec![
            row("id", "int"),
            row("name", "string"),
            DescriptionRow::new(COLUMN_HEADER_MARKER, Some("data_type"), Some("comment")),
            row("year", "int"),
            DescriptionRow::marker(PARTITION_INFORMATION_MARKER),
            DescriptionRow::marker(DETAILED_TABLE_INFORMATION_MARKER),
            row("Database", "default"),
            row("Table", "t1"),
        ];
        let detail = DetailAttributes::new(vec!["year".to_string()], 3, 1024);
        let metadata = classify(&rows, Some(&detail)).unwrap();

        let columns: Vec<&str> = metadata.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(columns, vec!["id", "name", COLUMN_HEADER_MARKER, "year"]);
        assert_eq!(
            metadata.partition_columns,
            Some(vec![PartitionColumn {
                name: "year".to_string(),
                data_type: Some("int".to_string()),
            }])
        );
        assert_eq!(
            metadata.property("Database"),
            Some(&PropertyValue::Text(Some("default".to_string())))
        );
        assert_eq!(
            metadata.property("Table"),
            Some(&PropertyValue::Text(Some("t1".to_string())))
        );
        assert_eq!(
            metadata.property(PARTITION_COLUMNS_PROPERTY),
            Some(&PropertyValue::List(vec!["year".to_string()]))
        );
        assert_eq!(
            metadata.property(NUM_FILES_PROPERTY),
            Some(&PropertyValue::Integer(Some(3)))
        );
        assert_eq!(
            metadata.property(SIZE_IN_BYTES_PROPERTY),
            Some(&PropertyValue::Integer(Some(1024)))
        );
    }

    #[test]
    fn test_buckets_are_disjoint_in_order() {
        let rows = partitioned_description();
        let metadata = classify(&rows, None).unwrap();

        let mut names: Vec<String> = metadata.columns.iter().map(|c| c.name.clone()).collect();
        names.extend(
            metadata
                .partition_columns
                .iter()
                .flatten()
                .map(|p| p.name.clone()),
        );
        names.extend(metadata.properties.iter().map(|p| p.key.clone()));

        // Every bucketed row appears in the input, in input order.
        let mut cursor = rows.iter().map(|r| r.name.clone());
        for name in &names {
            assert!(cursor.any(|n| &n == name), "{} out of order", name);
        }
        // Only marker and separator rows are left out.
        assert_eq!(names.len(), rows.len() - 4);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let rows = partitioned_description();
        let first = classify(&rows, Some(&detail())).unwrap();
        let second = classify(&rows, Some(&detail())).unwrap();
        assert_eq!(first, second);
    }
}
