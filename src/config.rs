//! Configuration file support
//!
//! Handles parsing of `.metastore-catalog.toml` configuration files and
//! environment variable overrides. Command line flags are applied on top by
//! the CLI.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::database::DestinationTables;

/// Default configuration filename
pub const CONFIG_FILENAME: &str = ".metastore-catalog.toml";

/// Default database filename for the DuckDB output
pub const DEFAULT_DUCKDB_FILENAME: &str = "metastore-catalog.duckdb";

/// Default log filter level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default poll interval between statement status checks
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default upper bound on a single metastore statement, including polling
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 600;

/// Environment variable for the metastore source kind
pub const ENV_SOURCE: &str = "METASTORE_CATALOG_SOURCE";

/// Environment variable for the snapshot file
pub const ENV_SNAPSHOT: &str = "METASTORE_CATALOG_SNAPSHOT";

/// Environment variable for the Databricks workspace URL
pub const ENV_HOST: &str = "METASTORE_CATALOG_HOST";

/// Environment variable for the Databricks access token
pub const ENV_TOKEN: &str = "METASTORE_CATALOG_TOKEN";

/// Environment variable for the SQL warehouse ID
pub const ENV_WAREHOUSE_ID: &str = "METASTORE_CATALOG_WAREHOUSE_ID";

/// Environment variable for the SQL warehouse HTTP path
pub const ENV_HTTP_PATH: &str = "METASTORE_CATALOG_HTTP_PATH";

/// Environment variable for the database list
pub const ENV_DB_LIST: &str = "METASTORE_CATALOG_DB_LIST";

/// Environment variable for the DuckDB output path
pub const ENV_DATABASE_PATH: &str = "METASTORE_CATALOG_DATABASE_PATH";

/// Environment variable for the log level
pub const ENV_LOG_LEVEL: &str = "METASTORE_CATALOG_LOG_LEVEL";

/// Error type for configuration handling
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    IoError(String),

    /// The file is not valid TOML for this configuration
    #[error("Config error: {0}")]
    ParseError(String),

    /// Serialization failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A required setting is missing or invalid
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration handling
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where enumeration and description queries are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// YAML snapshot file (default)
    #[default]
    Snapshot,
    /// Databricks SQL warehouse
    Databricks,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snapshot" => Ok(SourceKind::Snapshot),
            "databricks" => Ok(SourceKind::Databricks),
            _ => Err(format!(
                "Unknown source: {}. Use 'snapshot' or 'databricks'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Snapshot => write!(f, "snapshot"),
            SourceKind::Databricks => write!(f, "databricks"),
        }
    }
}

/// Metastore source section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    #[serde(default)]
    pub kind: SourceKind,

    /// Snapshot file (used when kind = "snapshot")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,

    /// Databricks workspace URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Databricks access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// SQL warehouse ID; derived from `http_path` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,

    /// SQL warehouse HTTP path, e.g. `/sql/1.0/warehouses/abc123`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_path: Option<String>,

    /// Catalog the statements run in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    /// `|`-delimited database list; unset or "None" selects every database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_list: Option<String>,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_poll_timeout_secs() -> u64 {
    DEFAULT_POLL_TIMEOUT_SECS
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            snapshot: None,
            host: None,
            token: None,
            warehouse_id: None,
            http_path: None,
            catalog: None,
            db_list: None,
            poll_interval_ms: default_poll_interval_ms(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

/// Output database section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// Path to DuckDB database file
    #[serde(default = "default_duckdb_path")]
    pub path: String,
}

fn default_duckdb_path() -> String {
    DEFAULT_DUCKDB_FILENAME.to_string()
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_duckdb_path(),
        }
    }
}

/// Logging section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Filter level for this crate (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also append logs to this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure
///
/// Represents the `.metastore-catalog.toml` configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub source: SourceSection,

    #[serde(default)]
    pub database: DatabaseSection,

    /// Destination table names
    #[serde(default)]
    pub destinations: DestinationTables,

    #[serde(default)]
    pub logging: LoggingSection,
}

impl CatalogConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// Falls back to defaults if the file does not exist. Environment
    /// overrides are applied in both cases.
    pub fn load(config_path: &Path) -> ConfigResult<Self> {
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::IoError(format!("Failed to read config: {}", e)))?;

            Self::parse(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> ConfigResult<Self> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a file
    pub fn save(&self, config_path: &Path) -> ConfigResult<()> {
        let content = self.to_toml()?;

        std::fs::write(config_path, content)
            .map_err(|e| ConfigError::IoError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to serialize config: {}", e))
        })
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(kind) = lookup(ENV_SOURCE)
            && let Ok(kind) = kind.parse()
        {
            self.source.kind = kind;
        }

        if let Some(path) = lookup(ENV_SNAPSHOT) {
            self.source.snapshot = Some(path);
        }
        if let Some(host) = lookup(ENV_HOST) {
            self.source.host = Some(host);
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.source.token = Some(token);
        }
        if let Some(id) = lookup(ENV_WAREHOUSE_ID) {
            self.source.warehouse_id = Some(id);
        }
        if let Some(path) = lookup(ENV_HTTP_PATH) {
            self.source.http_path = Some(path);
        }
        if let Some(list) = lookup(ENV_DB_LIST) {
            self.source.db_list = Some(list);
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.database.path = path;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
    }

    /// Snapshot path, required when the source is a snapshot
    pub fn snapshot_path(&self) -> ConfigResult<PathBuf> {
        self.source
            .snapshot
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::Invalid("source.snapshot is not set".to_string()))
    }

    /// Get the DuckDB database path
    pub fn duckdb_path(&self) -> PathBuf {
        if self.database.path.is_empty() {
            PathBuf::from(DEFAULT_DUCKDB_FILENAME)
        } else {
            PathBuf::from(&self.database.path)
        }
    }

    /// Build the Databricks connection settings from the source section
    #[cfg(feature = "databricks")]
    pub fn databricks_config(&self) -> ConfigResult<crate::metastore::DatabricksConfig> {
        use crate::metastore::DatabricksConfig;
        use std::time::Duration;

        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::Invalid(format!("source.{} is not set", name)))
        };

        let host = required(&self.source.host, "host")?;
        let token = required(&self.source.token, "token")?;
        let warehouse_id = match required(&self.source.warehouse_id, "warehouse_id") {
            Ok(id) => id,
            Err(e) => self
                .source
                .http_path
                .as_deref()
                .and_then(DatabricksConfig::warehouse_id_from_http_path)
                .ok_or(e)?,
        };

        let mut config = DatabricksConfig::new(host, token, warehouse_id);
        config.catalog = self.source.catalog.clone();
        config.poll_interval = Duration::from_millis(self.source.poll_interval_ms);
        config.poll_timeout = Duration::from_secs(self.source.poll_timeout_secs);
        Ok(config)
    }
}

/// Generate a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Metastore catalog configuration

[source]
# Metastore source: "snapshot" (default) or "databricks"
kind = "snapshot"

# YAML snapshot of the metastore (used when kind = "snapshot")
snapshot = "metastore-snapshot.yaml"

# Databricks SQL warehouse (used when kind = "databricks")
# host = "https://adb-1234567890.12.azuredatabricks.net"
# token = "dapi..."
# http_path = "/sql/1.0/warehouses/abc123"
# catalog = "hive_metastore"

# Databases to catalog, separated by "|". Unset or "None" catalogs every database.
# db_list = "sales|hr"

poll_interval_ms = 500
poll_timeout_secs = 600

[database]
# Path to the DuckDB output database
path = "metastore-catalog.duckdb"

[destinations]
tables = "sys.db_tables"
columns = "sys.db_table_columns"
partitions = "sys.db_table_partitions"
properties = "sys.db_table_properties"

[logging]
# error, warn, info, debug or trace; RUST_LOG takes precedence
level = "info"
# file = "metastore-catalog.log"
"#
}
