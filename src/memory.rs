//! Simulated Memory Region
//!
//! Stands in for the heap memory that sits next to a heartbeat buffer in a
//! real process. A recognizable secret marker is placed at offset 0 and is
//! followed by random filler, so an over-read shows the marker first.
//!
//! The region is built once before the server accepts anything and is never
//! written afterwards; connection threads share it through an `Arc`.

use bytes::{BufMut, Bytes, BytesMut};
use rand::rngs::OsRng;
use rand::RngCore;

/// Marker planted at the head of the region
pub const DEFAULT_SECRET_MARKER: &str =
    "TOP-SECRET: api_key=sk_demo_1234; password=hunter2; session=abcd\n";

/// Number of random filler bytes after the marker (8 KB)
pub const DEFAULT_FILLER_LEN: usize = 8 * 1024;

/// Read-only byte region that over-reads are served from
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    bytes: Bytes,
    marker_len: usize,
}

impl MemoryRegion {
    /// Build a region: `marker` followed by `filler_len` bytes from the OS CSPRNG
    pub fn seeded(marker: &[u8], filler_len: usize) -> Self {
        let mut filler = vec![0u8; filler_len];
        OsRng.fill_bytes(&mut filler);

        let mut bytes = BytesMut::with_capacity(marker.len() + filler_len);
        bytes.put_slice(marker);
        bytes.put_slice(&filler);

        tracing::debug!(
            marker_len = marker.len(),
            filler_len,
            "simulated memory region initialized"
        );

        Self {
            bytes: bytes.freeze(),
            marker_len: marker.len(),
        }
    }

    /// Region with the default marker and filler size
    pub fn with_defaults() -> Self {
        Self::seeded(DEFAULT_SECRET_MARKER.as_bytes(), DEFAULT_FILLER_LEN)
    }

    /// Region over caller-supplied contents (no marker bookkeeping)
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            marker_len: 0,
        }
    }

    /// First `min(n, len)` bytes of the region
    pub fn read_prefix(&self, n: usize) -> Bytes {
        self.bytes.slice(..n.min(self.bytes.len()))
    }

    /// The planted marker
    pub fn marker(&self) -> &[u8] {
        &self.bytes[..self.marker_len]
    }

    /// Total size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Default for MemoryRegion {
    fn default() -> Self {
        Self::with_defaults()
    }
}
