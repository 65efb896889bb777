//! Unit tests for the event-line framing codec.
//!
//! Covers:
//! - complete lines are emitted without their terminator
//! - batched lines are each decoded in order
//! - partial delivery is buffered until the newline arrives
//! - a multi-byte character split across two feeds is reassembled
//! - malformed byte sequences degrade to U+FFFD, never an error
//! - `decode_eof` flushes the final unterminated segment

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use sqlscope::stream::codec::EventLineCodec;

#[test]
fn single_line_decodes_without_terminator() {
    let mut codec = EventLineCodec::new();
    let mut buf = BytesMut::from("data: {\"type\":\"status\",\"message\":\"ok\"}\n");

    let result = codec
        .decode(&mut buf)
        .expect("decode must succeed for a terminated line");

    assert_eq!(
        result,
        Some("data: {\"type\":\"status\",\"message\":\"ok\"}".to_owned()),
        "codec must return the line content without the trailing newline"
    );
}

#[test]
fn batched_lines_are_each_decoded() {
    let mut codec = EventLineCodec::new();
    let mut buf = BytesMut::from("first\nsecond\n");

    assert_eq!(codec.decode(&mut buf).expect("first decode"), Some("first".to_owned()));
    assert_eq!(
        codec.decode(&mut buf).expect("second decode"),
        Some("second".to_owned())
    );
    assert_eq!(
        codec.decode(&mut buf).expect("buffer now empty"),
        None,
        "no further lines must be present"
    );
}

#[test]
fn partial_delivery_is_buffered_until_newline() {
    let mut codec = EventLineCodec::new();
    let mut buf = BytesMut::from("data: {\"type\":\"sta");

    let result = codec.decode(&mut buf).expect("partial decode must not error");
    assert!(
        result.is_none(),
        "partial line must not be emitted before the newline arrives"
    );

    buf.extend_from_slice(b"tus\",\"message\":\"hi\"}\n");
    let result = codec.decode(&mut buf).expect("decode after newline");
    assert_eq!(
        result,
        Some("data: {\"type\":\"status\",\"message\":\"hi\"}".to_owned()),
        "the complete line must be emitted once the newline arrives"
    );
}

#[test]
fn multibyte_character_split_across_feeds_is_reassembled() {
    let mut codec = EventLineCodec::new();

    // 'é' is 0xC3 0xA9; split it between two reads.
    let mut buf = BytesMut::from(&b"caf\xC3"[..]);
    let result = codec.decode(&mut buf).expect("mid-character decode");
    assert!(result.is_none(), "incomplete character must stay buffered");

    buf.extend_from_slice(b"\xA9 au lait\n");
    let result = codec.decode(&mut buf).expect("decode after completion");
    assert_eq!(
        result,
        Some("café au lait".to_owned()),
        "the split character must decode intact"
    );
}

#[test]
fn malformed_bytes_degrade_to_substitution() {
    let mut codec = EventLineCodec::new();
    let mut buf = BytesMut::from(&b"bad \xFF byte\n"[..]);

    let result = codec
        .decode(&mut buf)
        .expect("malformed bytes must not raise");

    assert_eq!(
        result,
        Some("bad \u{FFFD} byte".to_owned()),
        "invalid sequences must be substituted, not dropped"
    );
}

#[test]
fn decode_eof_flushes_final_partial_line() {
    let mut codec = EventLineCodec::new();
    let mut buf = BytesMut::from("complete\ntrailing");

    assert_eq!(
        codec.decode(&mut buf).expect("complete line"),
        Some("complete".to_owned())
    );
    assert_eq!(codec.decode(&mut buf).expect("no newline yet"), None);

    let tail = codec.decode_eof(&mut buf).expect("eof flush");
    assert_eq!(
        tail,
        Some("trailing".to_owned()),
        "the unterminated tail must be flushed at EOF"
    );
    assert_eq!(
        codec.decode_eof(&mut buf).expect("empty eof"),
        None,
        "a drained buffer must yield nothing further"
    );
}

#[test]
fn decode_eof_on_empty_stream_yields_nothing() {
    let mut codec = EventLineCodec::new();
    let mut buf = BytesMut::new();

    assert_eq!(codec.decode_eof(&mut buf).expect("empty eof"), None);
}

#[test]
fn no_byte_is_dropped_across_many_small_feeds() {
    let payload = "data: {\"type\":\"content\",\"chunk\":\"héllo wörld\"}\ndata: {\"type\":\"done\",\"record_id\":1,\"duration\":5}\n";
    let whole = {
        let mut codec = EventLineCodec::new();
        let mut buf = BytesMut::from(payload);
        let mut lines = Vec::new();
        while let Some(line) = codec.decode(&mut buf).expect("whole decode") {
            lines.push(line);
        }
        lines
    };

    for chunk_size in [1, 2, 3, 5, 7] {
        let mut codec = EventLineCodec::new();
        let mut buf = BytesMut::new();
        let mut lines = Vec::new();
        for chunk in payload.as_bytes().chunks(chunk_size) {
            buf.extend_from_slice(chunk);
            while let Some(line) = codec.decode(&mut buf).expect("chunked decode") {
                lines.push(line);
            }
        }
        if let Some(tail) = codec.decode_eof(&mut buf).expect("eof") {
            lines.push(tail);
        }
        assert_eq!(
            lines, whole,
            "chunk size {chunk_size} must reproduce the whole-feed line sequence"
        );
    }
}
