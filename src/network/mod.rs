//! Network Module
//!
//! TCP responder: accept loop, per-connection handler, payload probe.
//!
//! ## Architecture
//! - Single acceptor loop (non-blocking accept, polled for shutdown)
//! - One detached thread per connection
//! - Connections share only the read-only memory region

mod server;
mod connection;
mod probe;

pub use server::{Server, ShutdownHandle};
pub use connection::{CloseReason, Connection, ConnectionSummary, HandlerSettings};
pub use probe::{PayloadProbe, TimedRead};
