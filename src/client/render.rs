//! Rendering of received bytes
//!
//! Printable ASCII (0x20..=0x7e) plus `\n`, `\t` and `\r` are kept as-is;
//! every other byte becomes a lowercase `\xHH` escape.

use std::fmt::Write;

use super::Exchange;

/// Render bytes for a terminal
pub fn sanitize(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            0x20..=0x7e | b'\n' | b'\t' | b'\r' => out.push(b as char),
            _ => {
                // writing to a String cannot fail
                let _ = write!(out, "\\x{:02x}", b);
            }
        }
    }
    out
}

/// Full client report for one exchange
pub fn render_report(exchange: &Exchange) -> String {
    let sent = exchange.sent_payload();
    format!(
        "requested len={}, sent payload={:?} ({} bytes)\n\
         received {} bytes, {} beyond what was sent\n\
         ------ leaked bytes ------\n\
         {}\n\
         --------------------------",
        exchange.requested(),
        String::from_utf8_lossy(sent),
        sent.len(),
        exchange.received().len(),
        exchange.disclosed().len(),
        sanitize(exchange.received()),
    )
}
