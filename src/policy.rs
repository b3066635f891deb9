//! Response Policy
//!
//! Decides how long a heartbeat response is and what goes into it.
//!
//! ## The whole difference between the two modes
//! ```text
//! vulnerable: response_len = N
//! safe:       response_len = min(N, M)
//! ```
//! where `N` is the declared length from the request header and `M` is the
//! number of payload bytes that actually arrived. Whatever the response needs
//! beyond `M` is copied from the head of the simulated memory region.

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::BleedError;
use crate::memory::MemoryRegion;

/// How the responder sizes its reply
///
/// Fixed for the lifetime of a server instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponsePolicy {
    /// Trust the declared length (CVE-2014-0160 behaviour)
    #[default]
    Vulnerable,

    /// Clamp the declared length to the bytes actually received
    Safe,
}

impl ResponsePolicy {
    /// Length of the response payload for a request declaring `declared`
    /// bytes of which `received` actually arrived
    pub fn response_length(self, declared: u16, received: usize) -> u16 {
        match self {
            ResponsePolicy::Vulnerable => declared,
            // received > u16::MAX can only clamp down to declared
            ResponsePolicy::Safe => declared.min(u16::try_from(received).unwrap_or(u16::MAX)),
        }
    }

    /// Build the response payload
    ///
    /// The received bytes are copied verbatim as a prefix (truncated to the
    /// response length). If the response is longer than what was received,
    /// the deficit is filled from `region.read_prefix`, which itself clamps to
    /// the region size; anything the region cannot cover is zero-filled, so the
    /// body is always exactly the response length. Only the vulnerable policy
    /// can reach that branch.
    pub fn build_response(self, declared: u16, received: &[u8], region: &MemoryRegion) -> Bytes {
        let response_len = self.response_length(declared, received.len()) as usize;
        let echoed = received.len().min(response_len);

        let mut payload = BytesMut::with_capacity(response_len);
        payload.put_slice(&received[..echoed]);

        if response_len > echoed {
            let leaked = region.read_prefix(response_len - echoed);
            tracing::warn!(
                declared,
                received = received.len(),
                disclosed = leaked.len(),
                "over-read: appending simulated memory to response"
            );
            payload.put_slice(&leaked);
            payload.resize(response_len, 0);
        }

        payload.freeze()
    }

    /// True for the vulnerable policy
    pub fn is_vulnerable(self) -> bool {
        self == ResponsePolicy::Vulnerable
    }
}

impl fmt::Display for ResponsePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponsePolicy::Vulnerable => f.write_str("vulnerable"),
            ResponsePolicy::Safe => f.write_str("safe"),
        }
    }
}

impl FromStr for ResponsePolicy {
    type Err = BleedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vulnerable" => Ok(ResponsePolicy::Vulnerable),
            "safe" => Ok(ResponsePolicy::Safe),
            other => Err(BleedError::Config(format!(
                "unknown response policy '{}' (expected 'vulnerable' or 'safe')",
                other
            ))),
        }
    }
}
