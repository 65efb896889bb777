//! AI provider configuration entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured AI provider (endpoint + credentials) on the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AiProvider {
    /// Server-assigned identifier; absent when creating a new entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Stable machine name (e.g. `openai`, `claude`).
    pub provider_name: String,
    /// Human-readable name shown in listings.
    pub provider_display_name: String,
    /// Base URL of the provider's API.
    pub api_endpoint: String,
    /// API key as stored by the service (encrypted at rest server-side).
    pub api_key: String,
    /// Whether the provider may be used for checks.
    pub is_active: bool,
    /// Creation timestamp, server-assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last-update timestamp, server-assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
