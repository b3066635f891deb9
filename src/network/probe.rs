//! Payload Probe
//!
//! The protocol has no field that says how many payload bytes a peer really
//! sent. The responder has to guess from what the transport has ready:
//!
//! 1. Bytes already sitting in the read buffer are taken immediately, up to
//!    the declared length. No blocking.
//! 2. Otherwise wait at most `max_wait` for data, then take whatever one read
//!    returns, up to `min(declared, max_len)`.
//! 3. A timeout (or end of stream) with nothing read means zero bytes.
//!
//! This does not reproduce TCP segment boundaries. A sender whose payload
//! trickles in over several segments will look shorter than it is.

use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::net::TcpStream;
use std::time::Duration;

use bytes::Bytes;

use crate::config::Config;
use crate::error::Result;

/// A byte source whose blocking reads can be bounded
pub trait TimedRead: Read {
    /// Set (or clear, with `None`) the timeout applied to subsequent reads
    fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()>;
}

impl TimedRead for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }
}

/// Bounded-wait heuristic for the number of payload bytes actually delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadProbe {
    /// How long to wait for the first byte when nothing is buffered
    pub max_wait: Duration,

    /// Read cap for a probe that had to wait
    pub max_len: usize,
}

impl PayloadProbe {
    pub fn new(max_wait: Duration, max_len: usize) -> Self {
        Self { max_wait, max_len }
    }

    /// Read the payload bytes that are available for a frame declaring `declared` bytes
    ///
    /// `resume` is the read timeout put back on the transport once a bounded
    /// wait is over. Errors other than a timeout are returned to the caller.
    pub fn probe_available_payload<R: TimedRead>(
        &self,
        reader: &mut BufReader<R>,
        declared: u16,
        resume: Option<Duration>,
    ) -> Result<Bytes> {
        let declared = declared as usize;
        if declared == 0 {
            return Ok(Bytes::new());
        }

        let queued = reader.buffer().len();
        if queued > 0 {
            let take = declared.min(queued);
            let bytes = Bytes::copy_from_slice(&reader.buffer()[..take]);
            reader.consume(take);
            tracing::trace!(declared, queued, taken = take, "payload taken from buffer");
            return Ok(bytes);
        }

        // never wait past the connection's own deadline
        let wait = resume.map_or(self.max_wait, |r| self.max_wait.min(r));

        let mut buf = vec![0u8; declared.min(self.max_len)];
        reader.get_ref().set_read_timeout(Some(wait))?;
        let outcome = loop {
            match reader.read(&mut buf) {
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                other => break other,
            }
        };
        reader.get_ref().set_read_timeout(resume)?;

        let n = match outcome {
            Ok(n) => n,
            Err(e) if is_wait_expired(e.kind()) => {
                tracing::trace!(declared, wait = ?wait, "no payload within probe wait");
                0
            }
            Err(e) => return Err(e.into()),
        };

        buf.truncate(n);
        Ok(Bytes::from(buf))
    }
}

impl Default for PayloadProbe {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PayloadProbe {
    fn from(config: &Config) -> Self {
        Self::new(Duration::from_millis(config.probe_wait_ms), config.probe_max_len)
    }
}

fn is_wait_expired(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
