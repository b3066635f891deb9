//! Message definitions
//!
//! The three-field heartbeat message and its kind tag.

use bytes::Bytes;

use crate::error::{BleedError, Result};

/// Largest payload a frame can describe
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Message kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    Request = 0x01,
    Response = 0x02,
}

impl TryFrom<u8> for MessageKind {
    type Error = BleedError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(MessageKind::Request),
            0x02 => Ok(MessageKind::Response),
            other => Err(BleedError::UnknownKind(other)),
        }
    }
}

/// A well-formed heartbeat message
///
/// The declared length is always the payload length; a frame whose header
/// disagrees with its body can only be produced outside this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageKind,
    payload: Bytes,
}

impl Message {
    /// Create a message, rejecting payloads that do not fit a 16-bit length
    pub fn new(kind: MessageKind, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(BleedError::PayloadTooLarge(payload.len()));
        }
        Ok(Self { kind, payload })
    }

    /// Create a request message
    pub fn request(payload: impl Into<Bytes>) -> Result<Self> {
        Self::new(MessageKind::Request, payload)
    }

    /// Create a response message
    pub fn response(payload: impl Into<Bytes>) -> Result<Self> {
        Self::new(MessageKind::Response, payload)
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Length field written to the wire
    pub fn declared_length(&self) -> u16 {
        // bounded by MAX_PAYLOAD_LEN in `new`
        self.payload.len() as u16
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}
