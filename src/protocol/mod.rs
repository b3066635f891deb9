//! Protocol Module
//!
//! Defines the heartbeat wire protocol shared by responder and requester.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (2)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//! `Len` is big-endian. Nothing else on the wire says how many payload bytes
//! were really sent, which is the flaw being modelled.
//!
//! ### Kinds
//! - 0x01: REQUEST
//! - 0x02: RESPONSE

mod message;
mod codec;

pub use message::{Message, MessageKind, MAX_PAYLOAD_LEN};
pub use codec::{
    decode_message, encode_header, encode_message, read_header, read_message, write_message,
    FrameHeader, HEADER_SIZE,
};
