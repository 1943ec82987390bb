//! Run report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Failure, FailureKind};
use crate::database::WriteOutcome;

/// Summary of one catalog run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Metastore implementation the run read from
    pub source: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Databases the run covered, in processing order
    pub databases: Vec<String>,
    /// Tables described, including failed ones
    pub tables_processed: usize,
    /// Tables that contributed only their identity row
    pub tables_failed: usize,
    pub failures: Vec<Failure>,
    /// Destination writes; empty when nothing was published
    pub writes: Vec<WriteOutcome>,
}

impl RunReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source: source.into(),
            started_at: Utc::now(),
            finished_at: None,
            databases: Vec::new(),
            tables_processed: 0,
            tables_failed: 0,
            failures: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Record a failure
    pub fn record(&mut self, kind: FailureKind, scope: impl Into<String>, message: impl Into<String>) {
        self.failures.push(Failure::new(kind, scope, message));
    }

    /// Record the destination writes, adding a failure entry for each failed one
    pub fn record_writes(&mut self, writes: Vec<WriteOutcome>) {
        for write in &writes {
            if let Some(error) = &write.error {
                self.record(FailureKind::WriteFailure, write.table_name.clone(), error.clone());
            }
        }
        self.writes.extend(writes);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Failures of one kind
    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &Failure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    /// Whether any table, database or destination lost metadata
    pub fn has_errors(&self) -> bool {
        self.failures.iter().any(|f| f.kind.is_error())
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human readable summary
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Run {} ({})\n", self.run_id, self.source));
        output.push_str(&format!("Total databases: {}\n", self.databases.len()));
        output.push_str(&format!("Total tables: {}\n", self.tables_processed));
        output.push_str(&format!("Failed tables: {}\n", self.tables_failed));
        if let Some(ms) = self.duration_ms() {
            output.push_str(&format!("Duration: {} ms\n", ms));
        }

        if !self.writes.is_empty() {
            output.push_str("\nWrites:\n");
            for write in &self.writes {
                match &write.error {
                    None => output.push_str(&format!(
                        "  {:<30} {} rows\n",
                        write.table_name, write.rows_written
                    )),
                    Some(error) => {
                        output.push_str(&format!("  {:<30} FAILED: {}\n", write.table_name, error))
                    }
                }
            }
        }

        if !self.failures.is_empty() {
            output.push_str(&format!("\nIssues ({}):\n", self.failures.len()));
            for failure in &self.failures {
                output.push_str(&format!("  {}\n", failure));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Destination;

    #[test]
    fn test_fallback_alone_is_not_an_error() {
        let mut report = RunReport::new("snapshot");
        report.record(
            FailureKind::ConfigurationFallback,
            "databases",
            "no database list given",
        );
        report.record(FailureKind::DetailQueryFailure, "sales.orders", "no row");
        assert!(!report.has_errors());

        report.record(FailureKind::ClassificationFailure, "sales.broken", "boom");
        assert!(report.has_errors());
        assert_eq!(
            report
                .failures_of(FailureKind::ClassificationFailure)
                .count(),
            1
        );
    }

    #[test]
    fn test_record_writes_adds_failures() {
        let mut report = RunReport::new("snapshot");
        report.record_writes(vec![
            WriteOutcome {
                destination: Destination::Tables,
                table_name: "sys.db_tables".to_string(),
                rows_written: 4,
                error: None,
            },
            WriteOutcome {
                destination: Destination::Columns,
                table_name: "sys.db_table_columns".to_string(),
                rows_written: 0,
                error: Some("Write failed: disk full".to_string()),
            },
        ]);

        assert_eq!(report.writes.len(), 2);
        let failures: Vec<_> = report.failures_of(FailureKind::WriteFailure).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].scope, "sys.db_table_columns");
    }

    #[test]
    fn test_text_and_json() {
        let mut report = RunReport::new("snapshot");
        report.databases = vec!["sales".to_string(), "hr".to_string()];
        report.tables_processed = 5;
        report.finish();

        let text = report.to_text();
        assert!(text.contains("Total databases: 2"));
        assert!(text.contains("Total tables: 5"));
        assert!(!text.contains("Issues"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["tables_processed"], 5);
        assert_eq!(json["source"], "snapshot");
        assert!(json["finished_at"].is_string());
    }
}
