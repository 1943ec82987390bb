//! Databricks SQL metastore
//!
//! Runs enumeration and description statements on a SQL warehouse through
//! the Statement Execution API:
//!
//! - `POST {host}/api/2.0/sql/statements` submits a statement
//! - `GET {host}/api/2.0/sql/statements/{id}` polls until a terminal state
//! - `GET {host}/api/2.0/sql/statements/{id}/result/chunks/{n}` fetches
//!   further inline chunks
//!
//! Results are requested as `JSON_ARRAY` with `INLINE` disposition, so every
//! cell arrives as a nullable string and rows are mapped by column name
//! from the result manifest.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::sql::StatementBuilder;
use super::{MetastoreClient, MetastoreError, MetastoreResult};
use crate::config::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_SECS};
use crate::models::{DescriptionRow, DetailAttributes};

/// Server-side wait before the first response returns
pub const DEFAULT_WAIT_TIMEOUT: &str = "30s";

/// Connection settings for a Databricks SQL warehouse
#[derive(Debug, Clone)]
pub struct DatabricksConfig {
    /// Workspace URL, e.g. `https://adb-123.azuredatabricks.net`
    pub host: String,
    /// Personal access token or OAuth token
    pub token: String,
    /// SQL warehouse ID
    pub warehouse_id: String,
    /// Catalog the statements run in (warehouse default when unset)
    pub catalog: Option<String>,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

impl DatabricksConfig {
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        warehouse_id: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            warehouse_id: warehouse_id.into(),
            catalog: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
        }
    }

    /// Extract the warehouse ID from a SQL warehouse HTTP path
    /// (`/sql/1.0/warehouses/{id}`)
    pub fn warehouse_id_from_http_path(http_path: &str) -> Option<String> {
        http_path
            .trim_end_matches('/')
            .rsplit_once("/warehouses/")
            .map(|(_, id)| id.to_string())
            .filter(|id| !id.is_empty() && !id.contains('/'))
    }
}

/// Request body for statement execution
#[derive(Debug, Clone, Serialize)]
struct ExecuteStatementRequest<'a> {
    warehouse_id: &'a str,
    statement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    catalog: Option<&'a str>,
    disposition: &'static str,
    format: &'static str,
    wait_timeout: &'static str,
    on_wait_timeout: &'static str,
}

/// Response from statement execution or status polling
#[derive(Debug, Clone, Deserialize)]
struct StatementResponse {
    statement_id: String,
    status: StatementStatus,
    #[serde(default)]
    manifest: Option<ResultManifest>,
    #[serde(default)]
    result: Option<ResultData>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatementStatus {
    state: StatementState,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum StatementState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Closed,
}

#[derive(Debug, Clone, Deserialize)]
struct ServiceError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResultManifest {
    schema: ResultSchema,
}

#[derive(Debug, Clone, Deserialize)]
struct ResultSchema {
    #[serde(default)]
    columns: Vec<ResultColumn>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResultColumn {
    name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ResultData {
    #[serde(default)]
    next_chunk_index: Option<i64>,
    #[serde(default)]
    data_array: Option<Vec<Vec<Option<String>>>>,
}

/// Rows of a finished statement with their column names
#[derive(Debug, Clone, Default)]
struct StatementRows {
    columns: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl StatementRows {
    /// Index of the first matching column name
    fn column(&self, names: &[&str]) -> MetastoreResult<usize> {
        names
            .iter()
            .find_map(|name| self.columns.get(*name).copied())
            .ok_or_else(|| {
                MetastoreError::UnexpectedResult(format!(
                    "Expected column '{}' in result",
                    names.join("' or '")
                ))
            })
    }

    fn cell(row: &[Option<String>], index: usize) -> Option<String> {
        row.get(index).cloned().flatten()
    }
}

/// Metastore backed by a Databricks SQL warehouse
pub struct DatabricksMetastore {
    config: DatabricksConfig,
    client: reqwest::Client,
}

impl DatabricksMetastore {
    pub fn new(config: DatabricksConfig) -> MetastoreResult<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            MetastoreError::ConnectionFailed(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self { config, client })
    }

    fn base_url(&self) -> String {
        format!("{}/api/2.0/sql", self.config.host.trim_end_matches('/'))
    }

    /// Execute a statement and collect every inline row
    async fn run(&self, statement: &str) -> MetastoreResult<StatementRows> {
        let request = ExecuteStatementRequest {
            warehouse_id: &self.config.warehouse_id,
            statement,
            catalog: self.config.catalog.as_deref(),
            disposition: "INLINE",
            format: "JSON_ARRAY",
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            on_wait_timeout: "CONTINUE",
        };

        debug!("Executing statement: {}", statement);

        let url = format!("{}/statements", self.base_url());
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| MetastoreError::ConnectionFailed(format!("POST {}: {}", url, e)))?;
        let response: StatementResponse = Self::decode(response).await?;

        let finished = self.wait_for_completion(response).await?;
        self.collect_rows(finished).await
    }

    async fn get(&self, url: &str) -> MetastoreResult<reqwest::Response> {
        self.client
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| MetastoreError::ConnectionFailed(format!("GET {}: {}", url, e)))
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> MetastoreResult<T> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            MetastoreError::ConnectionFailed(format!("Failed to read response: {}", e))
        })?;
        if !status.is_success() {
            return Err(MetastoreError::StatementFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }
        serde_json::from_str(&body).map_err(|e| {
            MetastoreError::UnexpectedResult(format!(
                "Failed to parse response: {} - body: {}",
                e, body
            ))
        })
    }

    /// Poll until the statement reaches a terminal state
    async fn wait_for_completion(
        &self,
        response: StatementResponse,
    ) -> MetastoreResult<StatementResponse> {
        let start = Instant::now();
        let mut current = response;

        loop {
            match current.status.state {
                StatementState::Succeeded => return Ok(current),
                StatementState::Closed if current.result.is_some() => return Ok(current),
                StatementState::Failed | StatementState::Canceled | StatementState::Closed => {
                    let message = current
                        .status
                        .error
                        .as_ref()
                        .map(|e| {
                            format!(
                                "{}: {}",
                                e.error_code.as_deref().unwrap_or("UNKNOWN"),
                                e.message.as_deref().unwrap_or("no message")
                            )
                        })
                        .unwrap_or_else(|| format!("Statement {:?}", current.status.state));
                    return Err(MetastoreError::StatementFailed(message));
                }
                StatementState::Pending | StatementState::Running => {
                    if start.elapsed() > self.config.poll_timeout {
                        if let Err(e) = self.cancel_statement(&current.statement_id).await {
                            warn!(
                                "Failed to cancel statement {} after timeout: {}",
                                current.statement_id, e
                            );
                        }
                        return Err(MetastoreError::Timeout(
                            self.config.poll_timeout.as_millis() as u64,
                        ));
                    }
                    tokio::time::sleep(self.config.poll_interval).await;

                    let url = format!("{}/statements/{}", self.base_url(), current.statement_id);
                    debug!("Polling statement status: {}", current.statement_id);
                    current = Self::decode(self.get(&url).await?).await?;
                }
            }
        }
    }

    /// Ask the warehouse to stop a statement that is still running
    async fn cancel_statement(&self, statement_id: &str) -> MetastoreResult<()> {
        let url = format!("{}/statements/{}/cancel", self.base_url(), statement_id);
        debug!("Canceling statement at {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| MetastoreError::ConnectionFailed(format!("POST {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(MetastoreError::StatementFailed(format!(
                "HTTP {} canceling statement {}",
                response.status(),
                statement_id
            )));
        }

        debug!("Canceled statement: {}", statement_id);
        Ok(())
    }

    /// Gather the first result and any follow-up chunks
    async fn collect_rows(&self, response: StatementResponse) -> MetastoreResult<StatementRows> {
        let columns = response
            .manifest
            .as_ref()
            .map(|m| {
                m.schema
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (c.name.clone(), i))
                    .collect()
            })
            .unwrap_or_default();

        let mut rows = Vec::new();
        let mut next = response.result.unwrap_or_default();
        loop {
            rows.extend(next.data_array.take().unwrap_or_default());
            let Some(chunk_index) = next.next_chunk_index else {
                break;
            };
            let url = format!(
                "{}/statements/{}/result/chunks/{}",
                self.base_url(),
                response.statement_id,
                chunk_index
            );
            next = Self::decode(self.get(&url).await?).await?;
        }

        Ok(StatementRows { columns, rows })
    }
}

/// Map `DESCRIBE DETAIL` rows to detail attributes (first row only)
fn parse_detail(result: &StatementRows) -> MetastoreResult<Option<DetailAttributes>> {
    let Some(row) = result.rows.first() else {
        return Ok(None);
    };

    let partitions_idx = result.column(&["partitionColumns"])?;
    let files_idx = result.column(&["numFiles"])?;
    let size_idx = result.column(&["sizeInBytes"])?;

    let partition_columns = match StatementRows::cell(row, partitions_idx) {
        Some(text) => serde_json::from_str::<Vec<String>>(&text).map_err(|e| {
            MetastoreError::UnexpectedResult(format!("Invalid partitionColumns '{}': {}", text, e))
        })?,
        None => Vec::new(),
    };

    Ok(Some(DetailAttributes {
        partition_columns,
        num_files: parse_integer(StatementRows::cell(row, files_idx), "numFiles")?,
        size_in_bytes: parse_integer(StatementRows::cell(row, size_idx), "sizeInBytes")?,
    }))
}

fn parse_integer(value: Option<String>, field: &str) -> MetastoreResult<Option<i64>> {
    value
        .map(|text| {
            text.parse::<i64>().map_err(|e| {
                MetastoreError::UnexpectedResult(format!("Invalid {} '{}': {}", field, text, e))
            })
        })
        .transpose()
}

/// Map `DESCRIBE TABLE EXTENDED` rows to description rows
fn parse_description(result: &StatementRows) -> MetastoreResult<Vec<DescriptionRow>> {
    let name_idx = result.column(&["col_name"])?;
    let type_idx = result.column(&["data_type"])?;
    let comment_idx = result.column(&["comment"])?;

    Ok(result
        .rows
        .iter()
        .map(|row| DescriptionRow {
            name: StatementRows::cell(row, name_idx).unwrap_or_default(),
            value: StatementRows::cell(row, type_idx),
            comment: StatementRows::cell(row, comment_idx),
        })
        .collect())
}

/// Pull one named column out of every row
fn parse_names(result: &StatementRows, candidates: &[&str]) -> MetastoreResult<Vec<String>> {
    let idx = result.column(candidates)?;
    Ok(result
        .rows
        .iter()
        .filter_map(|row| StatementRows::cell(row, idx))
        .collect())
}

#[async_trait(?Send)]
impl MetastoreClient for DatabricksMetastore {
    async fn list_databases(&self) -> MetastoreResult<Vec<String>> {
        let result = self.run(&StatementBuilder::show_databases()).await?;
        parse_names(&result, &["databaseName", "namespace"])
    }

    async fn list_tables(&self, database: &str) -> MetastoreResult<Vec<String>> {
        let result = self.run(&StatementBuilder::show_tables(database)).await?;
        parse_names(&result, &["tableName"])
    }

    async fn describe_extended(
        &self,
        database: &str,
        table: &str,
    ) -> MetastoreResult<Vec<DescriptionRow>> {
        let result = self
            .run(&StatementBuilder::describe_extended(database, table))
            .await?;
        parse_description(&result)
    }

    async fn describe_detail(
        &self,
        database: &str,
        table: &str,
    ) -> MetastoreResult<Option<DetailAttributes>> {
        let result = self
            .run(&StatementBuilder::describe_detail(database, table))
            .await?;
        parse_detail(&result)
    }

    fn source_type(&self) -> &'static str {
        "databricks"
    }
}
