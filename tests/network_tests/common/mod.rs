//! Scripted in-memory transport
//!
//! Each `read` call consumes from the front of the script. A `Data` step
//! hands out bytes (a short buffer leaves the rest for the next read), a
//! `Stall` step behaves like an expired socket timeout, and an exhausted
//! script reads as end of stream.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read};
use std::sync::Mutex;
use std::time::Duration;

use bleedsim::network::TimedRead;

pub enum Step {
    Data(Vec<u8>),
    Stall,
    Fail(ErrorKind),
}

pub struct ScriptedStream {
    steps: VecDeque<Step>,
    timeouts: Mutex<Vec<Option<Duration>>>,
}

impl ScriptedStream {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            timeouts: Mutex::new(Vec::new()),
        }
    }

    /// Every timeout the reader was configured with, in order
    pub fn timeouts(&self) -> Vec<Option<Duration>> {
        self.timeouts.lock().unwrap().clone()
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.steps.pop_front() {
            None => Ok(0),
            Some(Step::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    let rest = data.split_off(n);
                    self.steps.push_front(Step::Data(rest));
                }
                Ok(n)
            }
            Some(Step::Stall) => Err(io::Error::new(ErrorKind::WouldBlock, "stalled")),
            Some(Step::Fail(kind)) => Err(io::Error::new(kind, "scripted failure")),
        }
    }
}

impl TimedRead for ScriptedStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.timeouts.lock().unwrap().push(timeout);
        Ok(())
    }
}

/// A request frame with an explicit declared length and raw payload
pub fn frame(kind: u8, declared: u16, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![kind];
    bytes.extend_from_slice(&declared.to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}
