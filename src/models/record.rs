//! Check history record entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the service's check history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CheckRecord {
    /// Record identifier.
    pub id: i64,
    /// Batch this record belongs to; single checks get their own batch.
    pub batch_id: String,
    /// The checked SQL statement as submitted.
    pub original_sql: String,
    /// SHA-256 of the statement, used by the service for deduplication.
    pub sql_hash: String,
    /// Kind of check (`single`, `batch`, `all`).
    pub check_type: String,
    /// Model that performed the analysis.
    pub ai_model_id: i64,
    /// Full analysis text, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_check_result: Option<String>,
    /// EXPLAIN output captured for the statement, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explain_result: Option<String>,
    /// Metrics extracted from the EXPLAIN output; shape is
    /// service-defined and passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_metrics: Option<serde_json::Value>,
    /// Outcome (`pending`, `success`, `failed`).
    pub check_status: String,
    /// Failure description, present when the check failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Analysis duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_duration: Option<u64>,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Completion timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
}
