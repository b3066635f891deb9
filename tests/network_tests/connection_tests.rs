//! Connection Handler Tests
//!
//! Drives the per-connection loop over a scripted transport and inspects
//! the bytes written back.

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bleedsim::network::{CloseReason, Connection, HandlerSettings, PayloadProbe};
use bleedsim::protocol::{decode_message, MessageKind, HEADER_SIZE};
use bleedsim::{BleedError, MemoryRegion, ResponsePolicy};
use common::{frame, ScriptedStream, Step};

// =============================================================================
// Helper Functions
// =============================================================================

fn region() -> Arc<MemoryRegion> {
    Arc::new(MemoryRegion::seeded(b"SECRET-MARKER;", 512))
}

fn settings(policy: ResponsePolicy) -> HandlerSettings {
    HandlerSettings {
        policy,
        probe: PayloadProbe::new(Duration::from_millis(20), 4096),
        idle_timeout: Duration::from_secs(60),
        write_timeout: Duration::from_secs(5),
    }
}

fn connection(
    steps: Vec<Step>,
    policy: ResponsePolicy,
    region: Arc<MemoryRegion>,
) -> Connection<ScriptedStream, Vec<u8>> {
    Connection::from_parts(
        ScriptedStream::new(steps),
        Vec::new(),
        region,
        settings(policy),
        "scripted",
    )
}

// =============================================================================
// Policy Scenarios
// =============================================================================

#[test]
fn test_vulnerable_response_leaks_region() {
    let region = region();
    let mut conn = connection(
        vec![Step::Data(frame(1, 200, b"hi"))],
        ResponsePolicy::Vulnerable,
        Arc::clone(&region),
    );

    let summary = conn.handle().unwrap();
    assert_eq!(summary.reason, CloseReason::PeerClosed);
    assert_eq!(summary.exchanges, 1);
    assert_eq!(summary.disclosed, 198);

    let response = decode_message(conn.writer()).unwrap();
    assert_eq!(response.kind(), MessageKind::Response);
    assert_eq!(response.declared_length(), 200);
    assert_eq!(&response.payload()[..2], b"hi");
    assert_eq!(&response.payload()[2..], &region.read_prefix(198)[..]);
    assert!(response.payload()[2..].starts_with(b"SECRET-MARKER;"));
}

#[test]
fn test_vulnerable_max_declared_length_is_honoured() {
    let region = Arc::new(MemoryRegion::with_defaults());
    let mut conn = connection(
        vec![Step::Data(frame(1, u16::MAX, b"hi"))],
        ResponsePolicy::Vulnerable,
        Arc::clone(&region),
    );

    let summary = conn.handle().unwrap();
    assert_eq!(summary.exchanges, 1);

    let written = conn.writer();
    assert_eq!(&written[..HEADER_SIZE], &[0x02, 0xff, 0xff]);

    let response = decode_message(written).unwrap();
    let body = response.payload();
    assert_eq!(response.declared_length(), u16::MAX);
    assert_eq!(&body[..2], b"hi");
    assert_eq!(&body[2..2 + region.len()], &region.read_prefix(region.len())[..]);
    assert!(body[2 + region.len()..].iter().all(|&b| b == 0));
}

#[test]
fn test_safe_response_is_clamped() {
    let mut conn = connection(
        vec![Step::Data(frame(1, 200, b"hi"))],
        ResponsePolicy::Safe,
        region(),
    );

    let summary = conn.handle().unwrap();
    assert_eq!(summary.exchanges, 1);
    assert_eq!(summary.disclosed, 0);

    let response = decode_message(conn.writer()).unwrap();
    assert_eq!(response.declared_length(), 2);
    assert_eq!(&response.payload()[..], b"hi");
}

#[test]
fn test_zero_length_request_under_both_policies() {
    for policy in [ResponsePolicy::Vulnerable, ResponsePolicy::Safe] {
        let mut conn = connection(vec![Step::Data(frame(1, 0, b""))], policy, region());

        conn.handle().unwrap();

        assert_eq!(conn.writer().as_slice(), &[2, 0, 0]);
    }
}

#[test]
fn test_payload_that_never_arrives() {
    let region = region();
    let mut conn = connection(
        vec![Step::Data(frame(1, 16, b"")), Step::Stall],
        ResponsePolicy::Vulnerable,
        Arc::clone(&region),
    );

    conn.handle().unwrap();

    let response = decode_message(conn.writer()).unwrap();
    assert_eq!(&response.payload()[..], &region.read_prefix(16)[..]);
}

#[test]
fn test_multiple_exchanges_on_one_connection() {
    let mut conn = connection(
        vec![
            Step::Data(frame(1, 3, b"one")),
            Step::Data(frame(1, 3, b"two")),
        ],
        ResponsePolicy::Safe,
        region(),
    );

    let summary = conn.handle().unwrap();
    assert_eq!(summary.exchanges, 2);

    let written = conn.writer();
    let first = decode_message(&written[..HEADER_SIZE + 3]).unwrap();
    let second = decode_message(&written[HEADER_SIZE + 3..]).unwrap();
    assert_eq!(&first.payload()[..], b"one");
    assert_eq!(&second.payload()[..], b"two");
}

// =============================================================================
// Close Paths
// =============================================================================

#[test]
fn test_close_after_one_header_byte_is_clean() {
    let mut conn = connection(vec![Step::Data(vec![1])], ResponsePolicy::Vulnerable, region());

    let summary = conn.handle().unwrap();

    assert_eq!(summary.reason, CloseReason::PeerClosed);
    assert_eq!(summary.exchanges, 0);
    assert!(conn.writer().is_empty());
}

#[test]
fn test_unknown_kind_closes_without_response() {
    let mut conn = connection(
        vec![Step::Data(frame(9, 2, b"hi"))],
        ResponsePolicy::Vulnerable,
        region(),
    );

    let result = conn.handle();

    assert!(matches!(result, Err(BleedError::UnknownKind(9))));
    assert!(conn.writer().is_empty());
}

#[test]
fn test_response_kind_from_peer_is_rejected() {
    let mut conn = connection(
        vec![Step::Data(frame(2, 2, b"hi"))],
        ResponsePolicy::Vulnerable,
        region(),
    );

    assert!(matches!(conn.handle(), Err(BleedError::Protocol(_))));
    assert!(conn.writer().is_empty());
}

#[test]
fn test_read_timeout_on_header_ends_connection() {
    let mut conn = connection(vec![Step::Stall], ResponsePolicy::Vulnerable, region());

    let summary = conn.handle().unwrap();

    assert_eq!(summary.reason, CloseReason::DeadlineExceeded);
}

#[test]
fn test_expired_deadline_closes_before_reading() {
    let mut settings = settings(ResponsePolicy::Vulnerable);
    settings.idle_timeout = Duration::from_millis(1);
    let mut conn = Connection::from_parts(
        ScriptedStream::new(vec![Step::Data(frame(1, 2, b"hi"))]),
        Vec::new(),
        region(),
        settings,
        "scripted",
    );
    thread::sleep(Duration::from_millis(10));

    let summary = conn.handle().unwrap();

    assert_eq!(summary.reason, CloseReason::DeadlineExceeded);
    assert!(conn.writer().is_empty());
}
