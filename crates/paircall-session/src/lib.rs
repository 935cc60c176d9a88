//! Call lifecycle and secure audio transport.
//!
//! `CallSession` is the explicit state machine governing one call at a
//! time; `CallEngine` owns the shared UDP socket, runs the listener that
//! dispatches key-exchange and audio datagrams, and drives the two audio
//! pump loops.

pub mod engine;
pub mod error;
pub mod pump;
pub mod state;

pub use engine::CallEngine;
pub use error::SessionError;
pub use state::{CallSession, CallState, KeyExchange, LinkSnapshot};
