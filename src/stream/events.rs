//! Typed events of the streaming check protocol.
//!
//! Each event-carrying line has the shape `data: {json}` where the JSON
//! object carries a `type` tag and type-specific fields.  Blank lines are
//! separators; anything without the marker is ignored.
//!
//! # Known event types
//!
//! | `type`    | Maps to                      |
//! |-----------|------------------------------|
//! | `status`  | [`CheckEvent::Status`]       |
//! | `start`   | [`CheckEvent::Start`]        |
//! | `explain` | [`CheckEvent::Explain`]      |
//! | `content` | [`CheckEvent::Content`]      |
//! | `done`    | [`CheckEvent::Done`]         |
//! | `error`   | [`CheckEvent::Error`]        |
//! | *(other)* | Skipped; logged at `DEBUG`   |
//!
//! Parsing never fails the stream: malformed payloads are dropped with a
//! diagnostic so one bad line cannot terminate an otherwise healthy
//! check.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Marker prefix of an event-carrying line.
const EVENT_MARKER: &str = "data: ";

/// One event of the streaming check protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckEvent {
    /// Informational progress message, not part of the result.
    Status {
        /// Human-readable status message.
        message: String,
    },
    /// Analysis started; the service allocated a history record.
    Start {
        /// History record identifier for this check.
        record_id: i64,
    },
    /// Execution-plan analysis produced by the service.
    Explain {
        /// Raw EXPLAIN output text.
        explain_result: String,
    },
    /// Next fragment of the incrementally generated analysis text.
    Content {
        /// Fragment to append; fragments are ordered.
        chunk: String,
    },
    /// Analysis finished successfully.  Terminal.
    Done {
        /// History record identifier for this check.
        record_id: i64,
        /// Total analysis duration in milliseconds.
        duration_ms: u64,
    },
    /// Analysis failed on the service side.  Terminal.
    Error {
        /// Server-supplied failure description.
        message: String,
    },
}

// ── Wire payloads ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StatusParams {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StartParams {
    record_id: i64,
}

#[derive(Debug, Deserialize)]
struct ExplainParams {
    explain_result: String,
}

#[derive(Debug, Deserialize)]
struct ContentParams {
    chunk: String,
}

#[derive(Debug, Deserialize)]
struct DoneParams {
    record_id: i64,
    /// Wire field name is `duration`; the unit is milliseconds.
    duration: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorParams {
    message: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse one decoded line into a [`CheckEvent`], if it carries one.
///
/// Returns `None` for every line that does not yield an event:
///
/// - lines without the `data: ` marker (blank separators included),
/// - payloads that are not well-formed JSON (logged at `WARN`),
/// - payloads with a missing or non-string `type` tag (logged at `WARN`),
/// - recognized types whose required fields are absent or mistyped
///   (logged at `WARN`),
/// - unknown `type` tags (logged at `DEBUG`; servers may add event types
///   this client does not know yet).
#[must_use]
pub fn parse_event_line(line: &str) -> Option<CheckEvent> {
    let payload = line.strip_prefix(EVENT_MARKER)?;

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, raw = payload, "event parse: malformed json payload, skipping");
            return None;
        }
    };

    let Some(kind) = value.get("type").and_then(Value::as_str) else {
        warn!(raw = payload, "event parse: payload without a `type` tag, skipping");
        return None;
    };

    match kind {
        "status" => from_payload::<StatusParams>(kind, &value)
            .map(|p| CheckEvent::Status { message: p.message }),
        "start" => from_payload::<StartParams>(kind, &value).map(|p| CheckEvent::Start {
            record_id: p.record_id,
        }),
        "explain" => from_payload::<ExplainParams>(kind, &value).map(|p| CheckEvent::Explain {
            explain_result: p.explain_result,
        }),
        "content" => {
            from_payload::<ContentParams>(kind, &value).map(|p| CheckEvent::Content { chunk: p.chunk })
        }
        "done" => from_payload::<DoneParams>(kind, &value).map(|p| CheckEvent::Done {
            record_id: p.record_id,
            duration_ms: p.duration,
        }),
        "error" => from_payload::<ErrorParams>(kind, &value)
            .map(|p| CheckEvent::Error { message: p.message }),
        other => {
            debug!(event_type = other, "event parse: skipping unknown event type");
            None
        }
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Deserialize a recognized payload, logging and dropping it on mismatch.
fn from_payload<T: serde::de::DeserializeOwned>(kind: &str, value: &Value) -> Option<T> {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(params) => Some(params),
        Err(err) => {
            warn!(
                event_type = kind,
                error = %err,
                "event parse: missing or mistyped field, skipping"
            );
            None
        }
    }
}
