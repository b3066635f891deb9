//! Client Module
//!
//! The requester side: sends one under-filled heartbeat and renders what
//! comes back.

mod requester;
mod render;

pub use requester::{Exchange, HeartbeatRequest, Requester};
pub use render::{render_report, sanitize};
