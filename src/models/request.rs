//! Request payloads for check submission endpoints.

use serde::{Deserialize, Serialize};

/// Submission payload for a single-statement check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CheckRequest {
    /// The SQL statement to analyse.
    pub sql_statement: String,
    /// Model to analyse with.
    pub model_id: i64,
    /// Pre-computed EXPLAIN output; when absent and `erp_config_id` is
    /// set, the service runs EXPLAIN itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain_result: Option<String>,
    /// ERP configuration used for the automatic EXPLAIN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_config_id: Option<i64>,
}

/// One statement of a batch submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BatchSqlItem {
    /// The SQL statement to analyse.
    pub sql: String,
    /// Pre-computed EXPLAIN output for this statement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain_result: Option<String>,
}

/// Submission payload for a batch check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BatchCheckRequest {
    /// The statements to analyse.
    pub sql_statements: Vec<BatchSqlItem>,
    /// Model to analyse with.
    pub model_id: i64,
    /// ERP configuration used for automatic EXPLAIN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_config_id: Option<i64>,
}

/// Submission payload for checking every statement of an ERP database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CheckAllRequest {
    /// ERP configuration to enumerate statements from.
    pub erp_config_id: i64,
    /// Model to analyse with.
    pub model_id: i64,
    /// Whether the service should EXPLAIN each statement first.
    pub auto_explain: bool,
}

/// Acknowledgement returned by the batch submission endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BatchSubmission {
    /// Identifier to poll progress with.
    pub batch_id: String,
    /// Number of statements accepted into the batch.
    #[serde(default)]
    pub total_count: u32,
}
