//! Connection Handler
//!
//! Runs the heartbeat exchange loop for a single peer.
//!
//! ## Per-frame steps
//! ```text
//! AwaitHeader ─► read kind + length (EOF here = clean close)
//!             ─► probe payload (M bytes, bounded wait)
//!             ─► kind must be REQUEST, else close
//!             ─► size + build response per policy
//!             ─► write response ─► AwaitHeader
//! ```

use std::io::{BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::probe::{PayloadProbe, TimedRead};
use crate::config::Config;
use crate::error::{BleedError, Result};
use crate::memory::MemoryRegion;
use crate::policy::ResponsePolicy;
use crate::protocol::{read_header, write_message, Message, MessageKind};

/// Per-server settings every handler is started with
#[derive(Debug, Clone, Copy)]
pub struct HandlerSettings {
    pub policy: ResponsePolicy,
    pub probe: PayloadProbe,

    /// Deadline for the whole connection, measured from accept
    pub idle_timeout: Duration,

    pub write_timeout: Duration,
}

impl From<&Config> for HandlerSettings {
    fn from(config: &Config) -> Self {
        Self {
            policy: config.policy,
            probe: PayloadProbe::from(config),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            write_timeout: Duration::from_millis(config.write_timeout_ms),
        }
    }
}

/// Why a connection ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer closed (or reset) the stream
    PeerClosed,

    /// The connection outlived its idle deadline
    DeadlineExceeded,
}

/// What a finished connection did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSummary {
    pub reason: CloseReason,

    /// Completed request/response exchanges
    pub exchanges: u64,

    /// Response bytes beyond what was received, across all exchanges
    pub disclosed: u64,
}

/// Handles a single peer connection
pub struct Connection<R: TimedRead, W: Write> {
    reader: BufReader<R>,
    writer: BufWriter<W>,
    region: Arc<MemoryRegion>,
    settings: HandlerSettings,
    deadline: Instant,
    peer_addr: String,
    exchanges: u64,
    disclosed: u64,
}

impl Connection<TcpStream, TcpStream> {
    /// Wrap an accepted TCP stream
    ///
    /// Sets up buffered I/O, disables Nagle and applies the write timeout.
    pub fn new(stream: TcpStream, region: Arc<MemoryRegion>, settings: HandlerSettings) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Accepted sockets may inherit the listener's non-blocking mode
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(settings.write_timeout))?;

        let read_stream = stream.try_clone()?;
        Ok(Self::from_parts(read_stream, stream, region, settings, peer_addr))
    }
}

impl<R: TimedRead, W: Write> Connection<R, W> {
    /// Build a handler over arbitrary read/write halves
    pub fn from_parts(
        reader: R,
        writer: W,
        region: Arc<MemoryRegion>,
        settings: HandlerSettings,
        peer_addr: impl Into<String>,
    ) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
            region,
            settings,
            deadline: Instant::now() + settings.idle_timeout,
            peer_addr: peer_addr.into(),
            exchanges: 0,
            disclosed: 0,
        }
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Serves exchanges until the peer disconnects or the deadline passes.
    /// Protocol violations and other I/O failures end the connection with an
    /// error; nothing more is written to the peer in that case.
    pub fn handle(&mut self) -> Result<ConnectionSummary> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let remaining = match self.remaining() {
                Some(remaining) => remaining,
                None => return Ok(self.close(CloseReason::DeadlineExceeded)),
            };
            self.reader.get_ref().set_read_timeout(Some(remaining))?;

            let header = match read_header(&mut self.reader) {
                Ok(Some(header)) => header,
                Ok(None) => return Ok(self.close(CloseReason::PeerClosed)),
                Err(e) if e.is_timeout() => return Ok(self.close(CloseReason::DeadlineExceeded)),
                Err(e) if e.is_disconnect() => {
                    tracing::debug!("Connection reset by client {}", self.peer_addr);
                    return Ok(self.close(CloseReason::PeerClosed));
                }
                Err(e) => {
                    tracing::warn!("Error reading header from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            let declared = header.declared_length;
            let payload = self
                .settings
                .probe
                .probe_available_payload(&mut self.reader, declared, Some(remaining))
                .map_err(|e| {
                    tracing::warn!("Error reading payload from {}: {}", self.peer_addr, e);
                    e
                })?;

            match header.message_kind() {
                Ok(MessageKind::Request) => {}
                Ok(MessageKind::Response) => {
                    tracing::warn!("Unexpected response frame from {}", self.peer_addr);
                    return Err(BleedError::Protocol(
                        "peer sent a response frame".to_string(),
                    ));
                }
                Err(e) => {
                    tracing::warn!("Unknown message kind from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            }

            tracing::trace!(
                peer = %self.peer_addr,
                declared,
                received = payload.len(),
                "heartbeat request"
            );

            let body = self
                .settings
                .policy
                .build_response(declared, &payload, &self.region);
            let disclosed = body.len().saturating_sub(payload.len());
            let response = Message::response(body)?;

            if let Err(e) = write_message(&mut self.writer, &response) {
                if e.is_disconnect() {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(self.close(CloseReason::PeerClosed));
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }

            self.exchanges += 1;
            self.disclosed += disclosed as u64;
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// The write half, for inspecting what was sent
    pub fn writer(&self) -> &W {
        self.writer.get_ref()
    }

    fn remaining(&self) -> Option<Duration> {
        self.deadline
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
    }

    fn close(&self, reason: CloseReason) -> ConnectionSummary {
        tracing::debug!("Client {} closed: {:?}", self.peer_addr, reason);
        ConnectionSummary {
            reason,
            exchanges: self.exchanges,
            disclosed: self.disclosed,
        }
    }
}
