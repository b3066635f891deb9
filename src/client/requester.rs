//! Requester
//!
//! Builds a heartbeat whose declared length is chosen independently of the
//! payload actually sent, performs one exchange and keeps the result.

use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{BleedError, Result};
use crate::protocol::{encode_header, read_message, MessageKind, HEADER_SIZE};

/// A request that may declare more payload than it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatRequest {
    declared_length: u16,
    payload: Bytes,
}

impl HeartbeatRequest {
    /// Validate the declared length (0..=65535) and pair it with a payload
    pub fn new(declared_length: i64, payload: impl Into<Bytes>) -> Result<Self> {
        let declared_length = u16::try_from(declared_length).map_err(|_| {
            BleedError::InvalidInput(format!(
                "declared length {} is outside 0..=65535",
                declared_length
            ))
        })?;

        Ok(Self {
            declared_length,
            payload: payload.into(),
        })
    }

    pub fn declared_length(&self) -> u16 {
        self.declared_length
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Wire bytes: a REQUEST header carrying the declared length, then the
    /// payload exactly as given
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
        buf.put_slice(&encode_header(MessageKind::Request, self.declared_length));
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}

/// Outcome of one request/response exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    requested: u16,
    sent: Bytes,
    received: Bytes,
}

impl Exchange {
    pub fn new(requested: u16, sent: Bytes, received: Bytes) -> Self {
        Self {
            requested,
            sent,
            received,
        }
    }

    /// Declared length of the request
    pub fn requested(&self) -> u16 {
        self.requested
    }

    /// Payload bytes actually transmitted
    pub fn sent_payload(&self) -> &[u8] {
        &self.sent
    }

    /// Response payload as received
    pub fn received(&self) -> &[u8] {
        &self.received
    }

    /// Received bytes past the echoed prefix
    pub fn disclosed(&self) -> &[u8] {
        &self.received[self.sent.len().min(self.received.len())..]
    }
}

/// Client side of the heartbeat protocol
#[derive(Debug, Clone)]
pub struct Requester {
    addr: String,
    timeout: Duration,
}

impl Requester {
    /// Create a requester for `addr` (host:port) with a 5 second I/O timeout
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Set the connect/read/write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send `request` and read exactly one response
    ///
    /// The response is read using the length the responder declares.
    pub fn exchange(&self, request: &HeartbeatRequest) -> Result<Exchange> {
        let mut stream = self.connect()?;
        tracing::info!("Connected to {}", self.addr);

        stream.write_all(&request.encode())?;
        stream.flush()?;
        tracing::info!(
            declared = request.declared_length(),
            sent = request.payload().len(),
            "heartbeat request sent"
        );

        let response = read_message(&mut stream)?.ok_or_else(|| {
            BleedError::Protocol("connection closed before a response arrived".to_string())
        })?;

        if response.kind() != MessageKind::Response {
            return Err(BleedError::Protocol(format!(
                "unexpected response kind: {:?}",
                response.kind()
            )));
        }

        Ok(Exchange::new(
            request.declared_length(),
            request.payload().clone(),
            response.into_payload(),
        ))
    }

    fn connect(&self) -> Result<TcpStream> {
        let mut last_err = None;

        for addr in self.addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_read_timeout(Some(self.timeout))?;
                    stream.set_write_timeout(Some(self.timeout))?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(match last_err {
            Some(e) => e.into(),
            None => BleedError::InvalidInput(format!("address '{}' did not resolve", self.addr)),
        })
    }
}
