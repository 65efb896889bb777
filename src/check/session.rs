//! State machine for one in-flight single-statement check.
//!
//! A [`CheckSession`] consumes [`CheckEvent`]s in arrival order and
//! maintains the evolving [`CheckResult`].  Every transition is a plain
//! function of the current result and one event, so any intermediate
//! state is reproducible in a test without a rendering surface.
//!
//! Once the result reaches [`CheckStatus::Success`] or
//! [`CheckStatus::Failed`] it is frozen: no later event, however
//! malformed the server, mutates it.  Running another check means
//! building a fresh session.

use serde::Serialize;

use crate::stream::events::CheckEvent;

/// Lifecycle status of a check result.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Check submitted, no `start` event observed yet.
    #[default]
    Pending,
    /// Analysis text is arriving incrementally.
    Streaming,
    /// Check finished successfully.  Terminal.
    Success,
    /// Check failed — remote error or transport failure.  Terminal.
    Failed,
}

/// Accumulating outcome of one check operation.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CheckResult {
    /// Current lifecycle status.
    pub status: CheckStatus,
    /// History record identifier, set on `start` and `done`.
    pub record_id: Option<i64>,
    /// EXPLAIN analysis text.  The last `explain` event observed wins.
    pub explain_text: Option<String>,
    /// Analysis text accumulated from `content` events, in arrival order.
    pub accumulated_text: String,
    /// Failure description, set only when the check fails.
    pub error_message: Option<String>,
    /// Total analysis duration in milliseconds, set on `done`.
    pub duration_ms: Option<u64>,
}

impl CheckResult {
    /// Whether the result is frozen.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, CheckStatus::Success | CheckStatus::Failed)
    }
}

/// State machine owning one in-flight check operation.
#[derive(Debug, Default)]
pub struct CheckSession {
    result: CheckResult,
}

impl CheckSession {
    /// Start a fresh session with an empty [`CheckResult`] in `Pending`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current result snapshot.
    #[must_use]
    pub fn result(&self) -> &CheckResult {
        &self.result
    }

    /// Whether the session reached `Success` or `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.result.is_terminal()
    }

    /// Consume the session, yielding the final result.
    #[must_use]
    pub fn into_result(self) -> CheckResult {
        self.result
    }

    /// Apply one protocol event to the result.
    ///
    /// Returns `true` when the result changed (the caller should publish
    /// a snapshot), `false` when the event was informational or arrived
    /// after a terminal state and was ignored.
    pub fn apply(&mut self, event: CheckEvent) -> bool {
        if self.result.is_terminal() {
            return false;
        }

        match event {
            // Informational only; surfaced by the caller, never stored.
            CheckEvent::Status { .. } => false,
            CheckEvent::Start { record_id } => {
                self.result.status = CheckStatus::Streaming;
                self.result.record_id = Some(record_id);
                true
            }
            CheckEvent::Explain { explain_result } => {
                self.result.explain_text = Some(explain_result);
                true
            }
            CheckEvent::Content { chunk } => {
                self.result.status = CheckStatus::Streaming;
                self.result.accumulated_text.push_str(&chunk);
                true
            }
            CheckEvent::Done {
                record_id,
                duration_ms,
            } => {
                self.result.status = CheckStatus::Success;
                self.result.record_id = Some(record_id);
                self.result.duration_ms = Some(duration_ms);
                true
            }
            CheckEvent::Error { message } => {
                self.result.status = CheckStatus::Failed;
                self.result.error_message = Some(message);
                true
            }
        }
    }

    /// Fail the session with a transport-level message.
    ///
    /// Used when the connection drops or errors before any terminal
    /// event.  A no-op once the session is terminal, so a late transport
    /// hiccup after a clean `done` never overwrites the outcome.
    pub fn fail_transport(&mut self, message: impl Into<String>) -> bool {
        if self.result.is_terminal() {
            return false;
        }
        self.result.status = CheckStatus::Failed;
        self.result.error_message = Some(message.into());
        true
    }
}
