//! Stream read loop for a single check.
//!
//! Drives [`FramedRead`] + [`EventLineCodec`] over the raw response body,
//! feeds each decoded line through [`parse_event_line`] into a
//! [`CheckSession`], and publishes a [`CheckResult`] snapshot through a
//! [`watch`] channel after every mutation.  The loop is strictly
//! sequential: events are applied in arrival order and nothing else
//! mutates the result.
//!
//! # Cancellation
//!
//! Respects `cancel`: when the token fires the loop returns immediately
//! with the result as it stands, dropping the framed reader — and with
//! it the underlying body — exactly once.  Abandonment does not force a
//! terminal state; only transport failure or a terminal event does.

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::check::session::{CheckResult, CheckSession};
use crate::stream::codec::EventLineCodec;
use crate::stream::events::{parse_event_line, CheckEvent};

/// Consume a streaming check response until a terminal event, EOF,
/// stream error, or cancellation.
///
/// Snapshots are published through `snapshot_tx` after every result
/// mutation; the returned [`CheckResult`] is the final state.
///
/// - EOF before a terminal event is a transport failure: connection
///   closure is only the expected termination *after* `done` or `error`.
/// - A read error before a terminal event likewise fails the session.
/// - After a terminal event the loop stops reading; trailing bytes are
///   never consumed.
pub async fn run_check<R>(
    body: R,
    snapshot_tx: &watch::Sender<CheckResult>,
    cancel: &CancellationToken,
) -> CheckResult
where
    R: AsyncRead + Unpin + Send,
{
    let mut session = CheckSession::new();
    let mut framed = FramedRead::new(body, EventLineCodec::new());

    loop {
        let item = tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("check stream: cancellation received, stopping");
                break;
            }

            item = framed.next() => item,
        };

        match item {
            None => {
                debug!("check stream: EOF");
                if session.fail_transport("stream closed before completion") {
                    let _ = snapshot_tx.send(session.result().clone());
                }
                break;
            }

            Some(Err(err)) => {
                warn!(error = %err, "check stream: read error, stopping");
                if session.fail_transport(format!("stream error: {err}")) {
                    let _ = snapshot_tx.send(session.result().clone());
                }
                break;
            }

            Some(Ok(line)) => {
                let Some(event) = parse_event_line(&line) else {
                    continue;
                };

                if let CheckEvent::Status { message } = &event {
                    info!(message = %message, "server status");
                }

                if session.apply(event) {
                    let _ = snapshot_tx.send(session.result().clone());
                }

                if session.is_terminal() {
                    debug!("check stream: terminal event observed, stopping");
                    break;
                }
            }
        }
    }

    session.into_result()
}

/// Build the terminal [`CheckResult`] for a check whose request failed
/// before any stream was produced (connection refused, non-success
/// response).
#[must_use]
pub fn transport_failure(message: impl Into<String>) -> CheckResult {
    let mut session = CheckSession::new();
    let _ = session.fail_transport(message);
    session.into_result()
}
