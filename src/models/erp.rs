//! ERP database configuration entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured ERP database the service can pull SQL statements from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ErpDatabase {
    /// Server-assigned identifier; absent when creating a new entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Human-readable configuration name.
    pub config_name: String,
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database (schema) name.
    pub database_name: String,
    /// Login user.
    pub username: String,
    /// Login password as stored by the service.
    pub password: String,
    /// Query the service runs to enumerate checkable SQL statements.
    pub sql_query_for_sqls: String,
    /// Whether the configuration may be used for checks.
    pub is_active: bool,
    /// Creation timestamp, server-assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last-update timestamp, server-assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One SQL statement enumerated from an ERP database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ErpSqlEntry {
    /// Statement identifier within the ERP source.
    pub id: i64,
    /// The SQL text.
    pub sql: String,
}

/// Listing of checkable statements for one ERP configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ErpSqlList {
    /// Total number of statements available.
    pub total: u32,
    /// The statements themselves.
    pub sqls: Vec<ErpSqlEntry>,
}
