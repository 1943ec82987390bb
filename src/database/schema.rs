//! Destination table definitions
//!
//! Four destinations receive the flattened metadata. Every column is
//! nullable text so the DDL works unchanged on any SQL backend.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{DatabaseError, DatabaseResult};

/// Default destination for table identities
pub const DEFAULT_TABLES_DESTINATION: &str = "sys.db_tables";

/// Default destination for column definitions
pub const DEFAULT_COLUMNS_DESTINATION: &str = "sys.db_table_columns";

/// Default destination for partition columns
pub const DEFAULT_PARTITIONS_DESTINATION: &str = "sys.db_table_partitions";

/// Default destination for table properties
pub const DEFAULT_PROPERTIES_DESTINATION: &str = "sys.db_table_properties";

/// The four destination collections, in write order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Tables,
    Columns,
    Partitions,
    Properties,
}

impl Destination {
    pub const ALL: [Destination; 4] = [
        Destination::Tables,
        Destination::Columns,
        Destination::Partitions,
        Destination::Properties,
    ];

    /// Destination column names, in insert order
    pub fn column_names(&self) -> &'static [&'static str] {
        match self {
            Destination::Tables => &["db_name", "table_name", "table_name_fully_qualified"],
            Destination::Columns => &[
                "db_name",
                "table_name",
                "column_name",
                "column_type",
                "column_comment",
            ],
            Destination::Partitions => &[
                "db_name",
                "table_name",
                "partition_column_name",
                "partition_column_type",
            ],
            Destination::Properties => &[
                "db_name",
                "table_name",
                "property_name",
                "property_value",
            ],
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Tables => write!(f, "tables"),
            Destination::Columns => write!(f, "columns"),
            Destination::Partitions => write!(f, "partitions"),
            Destination::Properties => write!(f, "properties"),
        }
    }
}

/// Names of the four destination tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationTables {
    #[serde(default = "default_tables")]
    pub tables: String,
    #[serde(default = "default_columns")]
    pub columns: String,
    #[serde(default = "default_partitions")]
    pub partitions: String,
    #[serde(default = "default_properties")]
    pub properties: String,
}

fn default_tables() -> String {
    DEFAULT_TABLES_DESTINATION.to_string()
}

fn default_columns() -> String {
    DEFAULT_COLUMNS_DESTINATION.to_string()
}

fn default_partitions() -> String {
    DEFAULT_PARTITIONS_DESTINATION.to_string()
}

fn default_properties() -> String {
    DEFAULT_PROPERTIES_DESTINATION.to_string()
}

impl Default for DestinationTables {
    fn default() -> Self {
        Self {
            tables: default_tables(),
            columns: default_columns(),
            partitions: default_partitions(),
            properties: default_properties(),
        }
    }
}

impl DestinationTables {
    /// Configured table name for a destination
    pub fn name_of(&self, destination: Destination) -> &str {
        match destination {
            Destination::Tables => &self.tables,
            Destination::Columns => &self.columns,
            Destination::Partitions => &self.partitions,
            Destination::Properties => &self.properties,
        }
    }
}

/// Parsed `[schema.]table` destination name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub table: String,
}

impl QualifiedName {
    /// Parse `table` or `schema.table`
    pub fn parse(name: &str) -> DatabaseResult<Self> {
        let parts: Vec<&str> = name.split('.').collect();
        let invalid = || DatabaseError::InvalidInput(format!("Invalid destination name '{}'", name));
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }
        match parts.as_slice() {
            [table] => Ok(Self {
                schema: None,
                table: table.to_string(),
            }),
            [schema, table] => Ok(Self {
                schema: Some(schema.to_string()),
                table: table.to_string(),
            }),
            _ => Err(invalid()),
        }
    }

    /// Double-quoted SQL form, `"schema"."table"`
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote(schema), quote(&self.table)),
            None => quote(&self.table),
        }
    }
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// SQL builders for destination tables
pub struct DatabaseSchema;

impl DatabaseSchema {
    /// `CREATE SCHEMA` (when qualified) and `CREATE TABLE` statements
    pub fn create_destination_sql(name: &str, destination: Destination) -> DatabaseResult<String> {
        let qualified = QualifiedName::parse(name)?;
        let mut sql = String::new();
        if let Some(schema) = &qualified.schema {
            sql.push_str(&format!("CREATE SCHEMA IF NOT EXISTS {};\n", quote(schema)));
        }
        let columns: Vec<String> = destination
            .column_names()
            .iter()
            .map(|c| format!("    {} TEXT", quote(c)))
            .collect();
        sql.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n",
            qualified.quoted(),
            columns.join(",\n")
        ));
        Ok(sql)
    }

    /// `DELETE FROM` statement that clears a destination
    pub fn clear_destination_sql(name: &str) -> DatabaseResult<String> {
        Ok(format!("DELETE FROM {}", QualifiedName::parse(name)?.quoted()))
    }

    /// Parameterized `INSERT` statement for one destination row
    pub fn insert_sql(name: &str, destination: Destination) -> DatabaseResult<String> {
        let qualified = QualifiedName::parse(name)?;
        let columns = destination.column_names();
        let names: Vec<String> = columns.iter().map(|c| quote(c)).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            qualified.quoted(),
            names.join(", "),
            placeholders
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_destinations() {
        let destinations = DestinationTables::default();
        assert_eq!(destinations.name_of(Destination::Tables), "sys.db_tables");
        assert_eq!(
            destinations.name_of(Destination::Properties),
            "sys.db_table_properties"
        );
    }

    #[test]
    fn test_qualified_name_parse() {
        let name = QualifiedName::parse("sys.db_tables").unwrap();
        assert_eq!(name.schema.as_deref(), Some("sys"));
        assert_eq!(name.table, "db_tables");
        assert_eq!(name.quoted(), r#""sys"."db_tables""#);

        let bare = QualifiedName::parse("db_tables").unwrap();
        assert!(bare.schema.is_none());

        assert!(QualifiedName::parse("a.b.c").is_err());
        assert!(QualifiedName::parse("sys.").is_err());
        assert!(QualifiedName::parse("").is_err());
    }

    #[test]
    fn test_create_destination_sql() {
        let sql =
            DatabaseSchema::create_destination_sql("sys.db_table_partitions", Destination::Partitions)
                .unwrap();
        assert!(sql.contains(r#"CREATE SCHEMA IF NOT EXISTS "sys""#));
        assert!(sql.contains(r#"CREATE TABLE IF NOT EXISTS "sys"."db_table_partitions""#));
        assert!(sql.contains(r#""partition_column_type" TEXT"#));
    }

    #[test]
    fn test_insert_sql() {
        let sql = DatabaseSchema::insert_sql("db_tables", Destination::Tables).unwrap();
        assert_eq!(
            sql,
            r#"INSERT INTO "db_tables" ("db_name", "table_name", "table_name_fully_qualified") VALUES (?, ?, ?)"#
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"we"ird"#), r#""we""ird""#);
    }
}
