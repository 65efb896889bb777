//! End-to-end tests for the streaming check pipeline:
//! bytes → line codec → event parser → session → snapshots.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio_util::codec::Decoder;
use tokio_util::sync::CancellationToken;

use sqlscope::check::runner::{run_check, transport_failure};
use sqlscope::check::session::{CheckResult, CheckStatus};
use sqlscope::stream::codec::EventLineCodec;
use sqlscope::stream::events::{parse_event_line, CheckEvent};

/// A well-formed streamed response: status, start, explain, two content
/// chunks (with multi-byte text), done — with blank separator lines.
const STREAM: &str = concat!(
    "data: {\"type\":\"status\",\"message\":\"running EXPLAIN\"}\n",
    "\n",
    "data: {\"type\":\"start\",\"record_id\":7}\n",
    "\n",
    "data: {\"type\":\"explain\",\"explain_result\":\"Seq Scan on users\"}\n",
    "\n",
    "data: {\"type\":\"content\",\"chunk\":\"Hello \"}\n",
    "data: {\"type\":\"content\",\"chunk\":\"wörld — ✓\"}\n",
    "\n",
    "data: {\"type\":\"done\",\"record_id\":7,\"duration\":120}\n",
);

fn snapshot_channel() -> (watch::Sender<CheckResult>, watch::Receiver<CheckResult>) {
    watch::channel(CheckResult::default())
}

/// Decode `payload` in chunks of `chunk_size` bytes and parse every
/// resulting line into events.
fn events_chunked(payload: &[u8], chunk_size: usize) -> Vec<CheckEvent> {
    let mut codec = EventLineCodec::new();
    let mut buf = BytesMut::new();
    let mut events = Vec::new();

    for chunk in payload.chunks(chunk_size) {
        buf.extend_from_slice(chunk);
        while let Some(line) = codec.decode(&mut buf).expect("decode never fails on content") {
            events.extend(parse_event_line(&line));
        }
    }
    if let Some(tail) = codec.decode_eof(&mut buf).expect("eof flush") {
        events.extend(parse_event_line(&tail));
    }
    events
}

#[test]
fn arbitrary_chunking_yields_the_identical_event_sequence() {
    let whole = events_chunked(STREAM.as_bytes(), STREAM.len());
    assert_eq!(whole.len(), 6, "the canonical stream carries six events");

    // Chunk sizes deliberately include 1 (every byte its own read) and
    // sizes that split multi-byte characters and JSON payloads.
    for chunk_size in 1..=16 {
        assert_eq!(
            events_chunked(STREAM.as_bytes(), chunk_size),
            whole,
            "chunk size {chunk_size} must not change the event sequence"
        );
    }
}

#[tokio::test]
async fn full_pipeline_builds_the_expected_result() {
    let (tx, rx) = snapshot_channel();
    let cancel = CancellationToken::new();

    let result = run_check(STREAM.as_bytes(), &tx, &cancel).await;

    assert_eq!(result.status, CheckStatus::Success);
    assert_eq!(result.record_id, Some(7));
    assert_eq!(result.accumulated_text, "Hello wörld — ✓");
    assert_eq!(result.explain_text.as_deref(), Some("Seq Scan on users"));
    assert_eq!(result.duration_ms, Some(120));
    assert_eq!(result.error_message, None);

    // The last published snapshot is the terminal result.
    assert_eq!(*rx.borrow(), result);
}

#[tokio::test]
async fn malformed_lines_do_not_terminate_the_stream() {
    let stream = concat!(
        "data: {\"type\":\"start\",\"record_id\":1}\n",
        "data: not-json at all\n",
        "data: {\"type\":\"unknown-kind\",\"x\":1}\n",
        "noise without marker\n",
        "data: {\"type\":\"content\",\"chunk\":\"ok\"}\n",
        "data: {\"type\":\"done\",\"record_id\":1,\"duration\":4}\n",
    );
    let (tx, _rx) = snapshot_channel();
    let cancel = CancellationToken::new();

    let result = run_check(stream.as_bytes(), &tx, &cancel).await;

    assert_eq!(result.status, CheckStatus::Success);
    assert_eq!(result.accumulated_text, "ok");
}

#[tokio::test]
async fn eof_before_terminal_event_fails_the_session() {
    let stream = concat!(
        "data: {\"type\":\"start\",\"record_id\":2}\n",
        "data: {\"type\":\"content\",\"chunk\":\"partial\"}\n",
    );
    let (tx, _rx) = snapshot_channel();
    let cancel = CancellationToken::new();

    let result = run_check(stream.as_bytes(), &tx, &cancel).await;

    assert_eq!(result.status, CheckStatus::Failed);
    assert_eq!(result.accumulated_text, "partial");
    assert_eq!(
        result.error_message.as_deref(),
        Some("stream closed before completion")
    );
}

#[tokio::test]
async fn reading_stops_at_the_first_terminal_event() {
    let stream = concat!(
        "data: {\"type\":\"error\",\"message\":\"adapter failed\"}\n",
        "data: {\"type\":\"done\",\"record_id\":9,\"duration\":1}\n",
    );
    let (tx, _rx) = snapshot_channel();
    let cancel = CancellationToken::new();

    let result = run_check(stream.as_bytes(), &tx, &cancel).await;

    assert_eq!(result.status, CheckStatus::Failed);
    assert_eq!(result.error_message.as_deref(), Some("adapter failed"));
    assert_eq!(
        result.duration_ms, None,
        "events after the terminal error must never be applied"
    );
}

#[tokio::test]
async fn cancellation_releases_the_read_loop_without_a_terminal_state() {
    let (mut writer, reader) = tokio::io::duplex(256);
    let (tx, _rx) = snapshot_channel();
    let cancel = CancellationToken::new();

    let loop_cancel = cancel.clone();
    let task =
        tokio::spawn(async move { run_check(reader, &tx, &loop_cancel).await });

    writer
        .write_all(b"data: {\"type\":\"start\",\"record_id\":3}\n")
        .await
        .expect("write start event");

    // Give the loop a moment to consume the event, then abandon it
    // while the writer is still open.
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("abandoned loop must return promptly")
        .expect("read loop must not panic");

    assert_eq!(result.status, CheckStatus::Streaming);
    assert_eq!(result.record_id, Some(3));
    assert!(!result.is_terminal(), "abandonment does not force an outcome");
}

#[tokio::test]
async fn pre_stream_failure_produces_a_failed_result() {
    let result = transport_failure("request failed: connection refused");

    assert_eq!(result.status, CheckStatus::Failed);
    assert_eq!(
        result.error_message.as_deref(),
        Some("request failed: connection refused")
    );
    assert_eq!(result.accumulated_text, "");
}
