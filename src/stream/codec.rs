//! Newline framing codec for the streaming check response body.
//!
//! The service delivers events as UTF-8 text lines, but the HTTP layer
//! hands the body over in arbitrary chunks — a line, a multi-byte
//! character, even a single JSON token can be split across two reads.
//! `EventLineCodec` buffers raw bytes until a `\n` arrives, so a split
//! never corrupts a line: bytes only leave the buffer as part of a
//! complete segment.
//!
//! Decoding is deliberately infallible with respect to content.  Complete
//! segments are converted with [`String::from_utf8_lossy`], so malformed
//! byte sequences degrade to U+FFFD substitution instead of aborting the
//! stream.  The only error the codec can surface is an I/O error bubbled
//! up by [`tokio_util::codec::FramedRead`].
//!
//! # Usage
//!
//! Use [`EventLineCodec`] as the codec parameter for
//! [`tokio_util::codec::FramedRead`] over the response body reader.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::{AppError, Result};

/// Newline framing codec with lossy UTF-8 recovery.
///
/// # Decoder
///
/// Each `\n`-terminated segment is emitted as one `String` (without the
/// terminator).  The trailing unterminated segment stays buffered until
/// its newline arrives; [`decode_eof`](Decoder::decode_eof) flushes it
/// when the stream closes mid-line.
#[derive(Debug, Default)]
pub struct EventLineCodec {
    // Index of the first byte not yet scanned for `\n`, so repeated
    // decode calls on a growing buffer stay linear in total input size.
    next_index: usize,
}

impl EventLineCodec {
    /// Create a new codec with an empty scan state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split off `len` buffered bytes plus the newline and decode them.
    fn take_line(&mut self, src: &mut BytesMut, len: usize) -> String {
        let line = src.split_to(len + 1);
        self.next_index = 0;
        String::from_utf8_lossy(&line[..len]).into_owned()
    }
}

impl Decoder for EventLineCodec {
    type Item = String;
    type Error = AppError;

    /// Decode the next complete line from `src`.
    ///
    /// Returns `Ok(None)` when `src` holds no newline yet (buffering);
    /// the partial bytes are retained for the next call.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
            self.next_index = src.len();
            return Ok(None);
        };

        let len = self.next_index + offset;
        Ok(Some(self.take_line(src, len)))
    }

    /// Flush the final, unterminated segment when the stream reaches EOF.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }

        let tail = src.split_to(src.len());
        self.next_index = 0;
        Ok(Some(String::from_utf8_lossy(&tail).into_owned()))
    }
}
