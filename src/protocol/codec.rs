//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (2)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! The codec never checks that a sender really supplied `Len` payload bytes.
//! Encoding a [`Message`] always writes exactly `Len` bytes, so a mismatched
//! frame can only come from code that writes a raw header on purpose.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{Message, MessageKind};
use crate::error::{BleedError, Result};

/// Header size: 1 byte kind + 2 bytes length
pub const HEADER_SIZE: usize = 3;

/// A decoded frame header
///
/// The kind byte is kept raw: the responder reads the payload before it
/// decides whether the kind is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub kind: u8,
    pub declared_length: u16,
}

impl FrameHeader {
    /// Parse a header from its 3 wire bytes
    pub fn parse(bytes: [u8; HEADER_SIZE]) -> Self {
        let mut buf = &bytes[..];
        Self {
            kind: buf.get_u8(),
            declared_length: buf.get_u16(),
        }
    }

    /// Interpret the kind byte
    pub fn message_kind(&self) -> Result<MessageKind> {
        MessageKind::try_from(self.kind)
    }
}

// =============================================================================
// Encoding/Decoding
// =============================================================================

/// Encode a header
///
/// Format: kind (1) + declared_length (2, big-endian)
pub fn encode_header(kind: MessageKind, declared_length: u16) -> [u8; HEADER_SIZE] {
    let len = declared_length.to_be_bytes();
    [kind as u8, len[0], len[1]]
}

/// Encode a message to bytes
pub fn encode_message(message: &Message) -> Bytes {
    let payload = message.payload();

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_u8(message.kind() as u8);
    buf.put_u16(message.declared_length());
    buf.put_slice(payload);

    buf.freeze()
}

/// Decode a message from bytes
///
/// Requires the header plus exactly the declared number of payload bytes.
pub fn decode_message(bytes: &[u8]) -> Result<Message> {
    if bytes.len() < HEADER_SIZE {
        return Err(BleedError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let header = FrameHeader::parse([bytes[0], bytes[1], bytes[2]]);
    let kind = header.message_kind()?;

    let body = &bytes[HEADER_SIZE..];
    let declared = header.declared_length as usize;
    if body.len() != declared {
        return Err(BleedError::Protocol(format!(
            "Payload length mismatch: declared {}, got {}",
            declared,
            body.len()
        )));
    }

    Message::new(kind, Bytes::copy_from_slice(body))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a frame header from a stream
///
/// Returns `Ok(None)` when the stream ends before a full header arrives,
/// including a close in the middle of the header.
pub fn read_header<R: Read>(reader: &mut R) -> Result<Option<FrameHeader>> {
    let mut header = [0u8; HEADER_SIZE];
    let mut filled = 0;

    while filled < HEADER_SIZE {
        match reader.read(&mut header[filled..]) {
            Ok(0) => {
                if filled > 0 {
                    tracing::debug!(filled, "stream ended mid-header");
                }
                return Ok(None);
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Some(FrameHeader::parse(header)))
}

/// Read a complete message from a stream
///
/// Trusts the declared length: blocks until that many payload bytes arrive.
pub fn read_message<R: Read>(reader: &mut R) -> Result<Option<Message>> {
    let header = match read_header(reader)? {
        Some(header) => header,
        None => return Ok(None),
    };
    let kind = header.message_kind()?;

    let mut payload = vec![0u8; header.declared_length as usize];
    if !payload.is_empty() {
        reader.read_exact(&mut payload)?;
    }

    Message::new(kind, payload).map(Some)
}

/// Write a message to a stream
pub fn write_message<W: Write>(writer: &mut W, message: &Message) -> Result<()> {
    let bytes = encode_message(message);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
