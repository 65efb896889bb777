//! Single-check sessions and batch progress polling.
//!
//! [`session`] owns the event-driven state machine of one in-flight
//! check; [`runner`] drives it from a raw response body; [`poller`]
//! tracks asynchronous batch jobs by polling their status at a fixed
//! interval.

pub mod poller;
pub mod runner;
pub mod session;
