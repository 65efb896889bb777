//! Line framing and event parsing for the streaming check protocol.
//!
//! The check service answers `POST /check/single/stream` with a chunked
//! body of newline-terminated event lines.  [`codec::EventLineCodec`]
//! reassembles raw chunks into complete lines regardless of where the
//! network fragments them; [`events::parse_event_line`] turns each
//! event-carrying line into a typed [`events::CheckEvent`].

pub mod codec;
pub mod events;
