//! In-memory `EngineLink` that replays canned engine output.

use std::collections::VecDeque;
use std::time::Duration;

use crate::bridge_errors::{BridgeError, BridgeResult};
use crate::channel::engine_link::EngineLink;
use crate::channel::wire_protocol::chunk_lines;

/// Each scripted chunk is returned by one `receive` call, in order. Once the
/// script runs out the link behaves like a closed peer, or like a silent one
/// when built with `stalled`.
#[derive(Debug, Default)]
pub struct ScriptedLink {
    incoming: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    stalled: bool,
    closed: bool,
}

impl ScriptedLink {
    /// A peer that answers with `incoming`, one chunk per `receive`.
    pub fn new(incoming: &[&str]) -> Self {
        Self {
            incoming: incoming.iter().map(|chunk| chunk.as_bytes().to_vec()).collect(),
            ..Self::default()
        }
    }

    /// A peer that never answers.
    pub fn stalled() -> Self {
        Self {
            stalled: true,
            ..Self::default()
        }
    }

    /// Everything sent so far, split into lines.
    pub fn sent_lines(&self) -> Vec<String> {
        self.sent.iter().flat_map(|chunk| chunk_lines(chunk)).collect()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl EngineLink for ScriptedLink {
    fn send(&mut self, bytes: &[u8]) -> BridgeResult<()> {
        if self.closed {
            return Err(BridgeError::ConnectionClosed);
        }
        self.sent.push(bytes.to_vec());
        Ok(())
    }

    fn receive(&mut self, max_bytes: usize, timeout: Option<Duration>) -> BridgeResult<Vec<u8>> {
        if self.closed {
            return Err(BridgeError::ConnectionClosed);
        }
        match self.incoming.pop_front() {
            Some(mut chunk) => {
                if chunk.len() > max_bytes {
                    let rest = chunk.split_off(max_bytes);
                    self.incoming.push_front(rest);
                }
                Ok(chunk)
            }
            None if self.stalled && timeout.is_some() => Err(BridgeError::Timeout {
                waiting_for: "engine data",
            }),
            None => Err(BridgeError::ConnectionClosed),
        }
    }

    fn close(&mut self) -> BridgeResult<()> {
        self.closed = true;
        Ok(())
    }
}
