//! Proctored session state machine and its async runner.
//!
//! A [`ProctorSession`] is a pure, synchronous state machine: it knows nothing
//! about the database, timers, or transports. The [`runner`] wraps one session
//! in a Tokio task that owns the wall clock and serializes events through a
//! command queue, so two browser signals can never race each other.

pub mod events;
pub mod runner;
pub mod session;

pub use events::{FocusSignal, NavDirection, SessionEvent};
pub use runner::{SessionHandle, spawn};
pub use session::{
    ProctorSession, SessionError, SessionOutcome, SessionQuestion, SessionState, VIOLATION_LIMIT,
};
