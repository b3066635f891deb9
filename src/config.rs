//! Configuration for bleedsim
//!
//! Centralized server configuration with sensible defaults.

use crate::error::{BleedError, Result};
use crate::memory::{DEFAULT_FILLER_LEN, DEFAULT_SECRET_MARKER};
use crate::policy::ResponsePolicy;

/// Main configuration for a responder instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// How often the accept loop wakes up to check for shutdown (milliseconds)
    pub accept_poll_ms: u64,

    /// Overall per-connection deadline, measured from accept (seconds)
    pub idle_timeout_secs: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Responder Configuration
    // -------------------------------------------------------------------------
    /// Response sizing policy, fixed for the server's lifetime
    pub policy: ResponsePolicy,

    /// Bounded wait for the first payload byte when nothing is queued (milliseconds)
    pub probe_wait_ms: u64,

    /// Read cap for a payload probe that had to wait
    pub probe_max_len: usize,

    // -------------------------------------------------------------------------
    // Simulated Memory Configuration
    // -------------------------------------------------------------------------
    /// Secret text planted at offset 0 of the memory region
    pub secret_marker: String,

    /// Random filler bytes following the marker
    pub filler_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:4444".to_string(),
            accept_poll_ms: 25,
            idle_timeout_secs: 5 * 60,
            write_timeout_ms: 5000,
            policy: ResponsePolicy::Vulnerable,
            probe_wait_ms: 50,
            probe_max_len: 4096,
            secret_marker: DEFAULT_SECRET_MARKER.to_string(),
            filler_len: DEFAULT_FILLER_LEN,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the responder cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.trim().is_empty() {
            return Err(BleedError::Config("listen address is empty".to_string()));
        }
        if self.probe_wait_ms == 0 {
            return Err(BleedError::Config("probe wait must be > 0 ms".to_string()));
        }
        if self.probe_max_len == 0 {
            return Err(BleedError::Config("probe max length must be > 0".to_string()));
        }
        if self.idle_timeout_secs == 0 {
            return Err(BleedError::Config("idle timeout must be > 0 s".to_string()));
        }
        if self.accept_poll_ms == 0 {
            return Err(BleedError::Config("accept poll interval must be > 0 ms".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the response policy
    pub fn policy(mut self, policy: ResponsePolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Set the bounded probe wait (in milliseconds)
    pub fn probe_wait_ms(mut self, ms: u64) -> Self {
        self.config.probe_wait_ms = ms;
        self
    }

    /// Set the probe read cap (in bytes)
    pub fn probe_max_len(mut self, len: usize) -> Self {
        self.config.probe_max_len = len;
        self
    }

    /// Set the per-connection deadline (in seconds)
    pub fn idle_timeout_secs(mut self, secs: u64) -> Self {
        self.config.idle_timeout_secs = secs;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the accept poll interval (in milliseconds)
    pub fn accept_poll_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_ms = ms;
        self
    }

    /// Set the planted secret marker
    pub fn secret_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.secret_marker = marker.into();
        self
    }

    /// Set the number of random filler bytes
    pub fn filler_len(mut self, len: usize) -> Self {
        self.config.filler_len = len;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
