//! bleedsim Client
//!
//! Sends one heartbeat that declares more than it carries and prints the reply.

use std::time::Duration;

use bleedsim::client::{render_report, HeartbeatRequest, Requester};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// bleedsim Client
#[derive(Parser, Debug)]
#[command(name = "bleedsim-client")]
#[command(about = "Issue one heartbeat request and show the response bytes")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:4444")]
    addr: String,

    /// Declared length to request (0..=65535, may exceed the payload)
    #[arg(short, long, default_value = "200", allow_hyphen_values = true)]
    len: i64,

    /// Payload actually sent
    #[arg(short, long, default_value = "hi")]
    payload: String,

    /// Connect/read/write timeout (ms)
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    // Validated before any connection is made
    let request = match HeartbeatRequest::new(args.len, args.payload.into_bytes()) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };

    let requester = Requester::new(&args.addr).with_timeout(Duration::from_millis(args.timeout_ms));

    match requester.exchange(&request) {
        Ok(exchange) => println!("{}", render_report(&exchange)),
        Err(e) => {
            tracing::error!("Exchange with {} failed: {}", args.addr, e);
            std::process::exit(1);
        }
    }
}
