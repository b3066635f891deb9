//! TCP Server
//!
//! Accepts connections and hands each one to its own thread.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::connection::{Connection, HandlerSettings};
use crate::config::Config;
use crate::error::Result;
use crate::memory::MemoryRegion;

/// Cloneable flag that stops a running [`Server`]
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the accept loop to stop; open connections finish on their own
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// TCP server for the heartbeat responder
pub struct Server {
    config: Config,
    region: Arc<MemoryRegion>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Validate the config and bind the listen address
    ///
    /// The memory region must already be built; it is shared read-only with
    /// every connection.
    pub fn bind(config: Config, region: Arc<MemoryRegion>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            region,
            listener,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to stop accepting
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Start the accept loop (blocking until shutdown)
    ///
    /// Accept failures are logged and do not stop the loop.
    pub fn run(&self) -> Result<()> {
        let settings = HandlerSettings::from(&self.config);
        let poll = Duration::from_millis(self.config.accept_poll_ms);

        tracing::info!(
            "Listening on {} (policy={})",
            self.local_addr()?,
            self.config.policy
        );

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, peer)) => self.spawn_handler(stream, peer, settings),
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(poll),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(poll);
                }
            }
        }

        tracing::info!("Accept loop stopped");
        Ok(())
    }

    fn spawn_handler(&self, stream: TcpStream, peer: SocketAddr, settings: HandlerSettings) {
        let region = Arc::clone(&self.region);

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                let mut connection = match Connection::new(stream, region, settings) {
                    Ok(connection) => connection,
                    Err(e) => {
                        tracing::warn!("Failed to set up connection from {}: {}", peer, e);
                        return;
                    }
                };

                match connection.handle() {
                    Ok(summary) => tracing::info!(
                        peer = %peer,
                        reason = ?summary.reason,
                        exchanges = summary.exchanges,
                        disclosed = summary.disclosed,
                        "connection closed"
                    ),
                    Err(e) => tracing::warn!(peer = %peer, error = %e, "connection terminated"),
                }
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn handler for {}: {}", peer, e);
        }
    }
}
