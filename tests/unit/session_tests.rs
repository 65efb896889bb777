//! Unit tests for the check session state machine.
//!
//! Covers:
//! - the streamed happy path accumulates chunks in order
//! - status events never mutate the result
//! - explain text is last-write-wins
//! - content before `start` still enters streaming
//! - terminal states freeze the result against all later input

use sqlscope::check::session::{CheckSession, CheckStatus};
use sqlscope::stream::events::CheckEvent;

fn start(record_id: i64) -> CheckEvent {
    CheckEvent::Start { record_id }
}

fn content(chunk: &str) -> CheckEvent {
    CheckEvent::Content {
        chunk: chunk.to_owned(),
    }
}

#[test]
fn streamed_happy_path_accumulates_in_order() {
    let mut session = CheckSession::new();
    assert_eq!(session.result().status, CheckStatus::Pending);

    assert!(session.apply(start(7)));
    assert_eq!(session.result().status, CheckStatus::Streaming);
    assert_eq!(session.result().record_id, Some(7));

    assert!(session.apply(content("Hello ")));
    assert!(session.apply(content("world")));
    assert!(session.apply(CheckEvent::Done {
        record_id: 7,
        duration_ms: 120
    }));

    let result = session.into_result();
    assert_eq!(result.status, CheckStatus::Success);
    assert_eq!(result.record_id, Some(7));
    assert_eq!(result.accumulated_text, "Hello world");
    assert_eq!(result.duration_ms, Some(120));
    assert_eq!(result.error_message, None);
}

#[test]
fn status_event_does_not_mutate_the_result() {
    let mut session = CheckSession::new();
    let before = session.result().clone();

    let changed = session.apply(CheckEvent::Status {
        message: "running EXPLAIN".to_owned(),
    });

    assert!(!changed, "status events are informational only");
    assert_eq!(session.result(), &before);
}

#[test]
fn explain_text_is_last_write_wins() {
    let mut session = CheckSession::new();
    assert!(session.apply(CheckEvent::Explain {
        explain_result: "first plan".to_owned()
    }));
    assert!(session.apply(CheckEvent::Explain {
        explain_result: "second plan".to_owned()
    }));

    assert_eq!(
        session.result().explain_text.as_deref(),
        Some("second plan"),
        "a later explain event overwrites the earlier one"
    );
}

#[test]
fn content_before_start_enters_streaming() {
    let mut session = CheckSession::new();
    assert!(session.apply(content("early")));

    assert_eq!(session.result().status, CheckStatus::Streaming);
    assert_eq!(session.result().accumulated_text, "early");
    assert_eq!(session.result().record_id, None);
}

#[test]
fn error_event_is_terminal() {
    let mut session = CheckSession::new();
    assert!(session.apply(start(3)));
    assert!(session.apply(content("partial")));
    assert!(session.apply(CheckEvent::Error {
        message: "model quota exhausted".to_owned()
    }));

    assert_eq!(session.result().status, CheckStatus::Failed);
    assert!(session.is_terminal());

    // Anything after the terminal event is ignored outright.
    assert!(!session.apply(content(" more")));
    assert!(!session.apply(CheckEvent::Done {
        record_id: 3,
        duration_ms: 9
    }));

    let result = session.into_result();
    assert_eq!(result.status, CheckStatus::Failed);
    assert_eq!(result.accumulated_text, "partial");
    assert_eq!(
        result.error_message.as_deref(),
        Some("model quota exhausted")
    );
    assert_eq!(result.duration_ms, None);
}

#[test]
fn success_freezes_against_transport_failure() {
    let mut session = CheckSession::new();
    assert!(session.apply(start(5)));
    assert!(session.apply(CheckEvent::Done {
        record_id: 5,
        duration_ms: 42
    }));

    assert!(
        !session.fail_transport("connection reset"),
        "a transport hiccup after done must not overwrite the outcome"
    );

    let result = session.into_result();
    assert_eq!(result.status, CheckStatus::Success);
    assert_eq!(result.error_message, None);
}

#[test]
fn transport_failure_before_completion_fails_the_session() {
    let mut session = CheckSession::new();
    assert!(session.apply(start(9)));

    assert!(session.fail_transport("stream closed before completion"));

    let result = session.into_result();
    assert_eq!(result.status, CheckStatus::Failed);
    assert_eq!(
        result.error_message.as_deref(),
        Some("stream closed before completion")
    );
}

#[test]
fn done_overwrites_record_id_from_start() {
    let mut session = CheckSession::new();
    assert!(session.apply(start(1)));
    assert!(session.apply(CheckEvent::Done {
        record_id: 2,
        duration_ms: 10
    }));

    assert_eq!(
        session.result().record_id,
        Some(2),
        "done carries the authoritative record id"
    );
}
