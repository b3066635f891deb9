//! bleedsim Server Binary
//!
//! Starts the heartbeat responder.

use std::sync::Arc;

use bleedsim::network::Server;
use bleedsim::{Config, MemoryRegion, ResponsePolicy};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// bleedsim Server
#[derive(Parser, Debug)]
#[command(name = "bleedsim-server")]
#[command(about = "Heartbeat responder with a toggleable over-read bug")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:4444")]
    listen: String,

    /// Clamp responses to the bytes actually received (the fix)
    #[arg(long)]
    safe: bool,

    /// Bounded wait for payload bytes when none are buffered (ms)
    #[arg(long, default_value = "50")]
    probe_wait_ms: u64,

    /// Read cap for a payload probe that had to wait (bytes)
    #[arg(long, default_value = "4096")]
    probe_max_len: usize,

    /// Per-connection deadline (seconds)
    #[arg(long, default_value = "300")]
    idle_timeout_secs: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bleedsim=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let policy = if args.safe {
        ResponsePolicy::Safe
    } else {
        ResponsePolicy::Vulnerable
    };

    tracing::info!("bleedsim server v{}", bleedsim::VERSION);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .policy(policy)
        .probe_wait_ms(args.probe_wait_ms)
        .probe_max_len(args.probe_max_len)
        .idle_timeout_secs(args.idle_timeout_secs)
        .build();

    // Built once, before anything is accepted
    let region = Arc::new(MemoryRegion::seeded(
        config.secret_marker.as_bytes(),
        config.filler_len,
    ));

    let server = match Server::bind(config, region) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
