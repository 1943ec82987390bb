//! SQL statements for metastore enumeration and description
//!
//! Identifiers are wrapped in backticks with embedded backticks doubled, so
//! database and table names are passed through verbatim.

/// Builds the statements sent to a SQL-speaking metastore
pub struct StatementBuilder;

impl StatementBuilder {
    /// `SHOW DATABASES`
    pub fn show_databases() -> String {
        "SHOW DATABASES".to_string()
    }

    /// `SHOW TABLES IN `db``
    pub fn show_tables(database: &str) -> String {
        format!("SHOW TABLES IN {}", Self::escape_identifier(database))
    }

    /// `DESCRIBE TABLE EXTENDED `db`.`table``
    pub fn describe_extended(database: &str, table: &str) -> String {
        format!(
            "DESCRIBE TABLE EXTENDED {}",
            Self::qualified_name(database, table)
        )
    }

    /// `DESCRIBE DETAIL `db`.`table``
    pub fn describe_detail(database: &str, table: &str) -> String {
        format!("DESCRIBE DETAIL {}", Self::qualified_name(database, table))
    }

    /// `` `db`.`table` ``
    pub fn qualified_name(database: &str, table: &str) -> String {
        format!(
            "{}.{}",
            Self::escape_identifier(database),
            Self::escape_identifier(table)
        )
    }

    /// Wrap an identifier in backticks, doubling any embedded backtick
    pub fn escape_identifier(name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_statements() {
        assert_eq!(StatementBuilder::show_databases(), "SHOW DATABASES");
        assert_eq!(StatementBuilder::show_tables("sales"), "SHOW TABLES IN `sales`");
    }

    #[test]
    fn test_describe_statements() {
        assert_eq!(
            StatementBuilder::describe_extended("sales", "orders"),
            "DESCRIBE TABLE EXTENDED `sales`.`orders`"
        );
        assert_eq!(
            StatementBuilder::describe_detail("sales", "orders"),
            "DESCRIBE DETAIL `sales`.`orders`"
        );
    }

    #[test]
    fn test_escape_identifier() {
        assert_eq!(StatementBuilder::escape_identifier("plain"), "`plain`");
        assert_eq!(StatementBuilder::escape_identifier("we`ird"), "`we``ird`");
        assert_eq!(
            StatementBuilder::escape_identifier("with.dot"),
            "`with.dot`"
        );
    }
}
