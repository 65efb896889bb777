//! AI model configuration entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured AI model bound to a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct AiModel {
    /// Server-assigned identifier; absent when creating a new entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Model identifier sent to the provider (e.g. `gpt-4o`).
    pub model_name: String,
    /// Human-readable name shown in listings.
    pub model_display_name: String,
    /// Owning provider's identifier.
    pub provider_id: i64,
    /// System prompt prepended to every check.
    pub system_prompt: String,
    /// Template the service fills with the SQL statement and EXPLAIN text.
    pub user_prompt_template: String,
    /// Completion token budget per check.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Whether the model may be selected for checks.
    pub is_active: bool,
    /// Creation timestamp, server-assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last-update timestamp, server-assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
