//! # bleedsim
//!
//! A small simulation of the Heartbleed (CVE-2014-0160) class of bug:
//! - A heartbeat protocol whose length field is the only length on the wire
//! - A responder that either trusts that length or clamps it
//! - A simulated memory region that over-reads are served from
//! - A requester that asks for more than it sends and shows what came back
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   REQUEST(N, M bytes)   ┌──────────────────────────┐
//! │  Requester   │ ──────────────────────► │   Server (accept loop)   │
//! │  (client)    │                         └────────────┬─────────────┘
//! └──────▲───────┘                                      │ thread per conn
//!        │                                 ┌────────────▼─────────────┐
//!        │                                 │   Connection handler     │
//!        │                                 │   probe M ─► policy      │
//!        │                                 └────────────┬─────────────┘
//!        │       RESPONSE(len, bytes)                   │ vulnerable only
//!        └───────────────────────────────  ┌────────────▼─────────────┐
//!                                          │  Simulated memory region │
//!                                          └──────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod memory;
pub mod policy;
pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BleedError, Result};
pub use config::Config;
pub use memory::MemoryRegion;
pub use policy::ResponsePolicy;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of bleedsim
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
