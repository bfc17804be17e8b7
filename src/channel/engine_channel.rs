//! Command/acknowledgment protocol run by the bridge over an `EngineLink`.
//!
//! Acknowledgment waits are strict about what counts as `ok` and lenient
//! about everything else: any other line that arrives while an `ok` is due is
//! logged and dropped. Result waits keep the last meaningful line and finish
//! on `stop`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::board::bridge_types::RelayMove;
use crate::bridge_errors::{BridgeError, BridgeResult};
use crate::channel::engine_link::{EngineLink, MESSAGE_BUFFER_SIZE};
use crate::channel::wire_protocol::{parse_result_line, EngineCommand, LineBuffer, ACK, STOP};

/// Where the channel stands in the command/acknowledgment exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    Pondering,
    AwaitingAck,
    Searching,
}

/// Limits for the blocking waits. `None` waits forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSettings {
    pub ack_timeout: Option<Duration>,
    pub result_timeout: Option<Duration>,
    pub buffer_size: usize,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            ack_timeout: None,
            result_timeout: None,
            buffer_size: MESSAGE_BUFFER_SIZE,
        }
    }
}

/// Bridge end of the engine protocol.
///
/// Sends one command per line and reads replies through a `LineBuffer`, so
/// a message split across reads is only seen once its newline arrives.
pub struct EngineChannel<L: EngineLink> {
    link: L,
    settings: ChannelSettings,
    state: HandshakeState,
    framer: LineBuffer,
    /// Lines received but not yet consumed.
    pending: VecDeque<String>,
}

impl<L: EngineLink> EngineChannel<L> {
    /// Wrap an open link. Nothing is sent until the first command.
    pub fn new(link: L, settings: ChannelSettings) -> Self {
        Self {
            link,
            settings,
            state: HandshakeState::Idle,
            framer: LineBuffer::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Opponent is on move; the engine may search speculatively.
    pub fn ponder(&mut self) -> BridgeResult<()> {
        self.send(EngineCommand::Ponder)?;
        self.state = HandshakeState::Pondering;
        Ok(())
    }

    /// Halt pondering and wait for `ok`.
    pub fn stop(&mut self) -> BridgeResult<()> {
        self.send(EngineCommand::Stop)?;
        self.state = HandshakeState::AwaitingAck;
        self.await_ack()
    }

    /// Relay the opponent's move and wait for `ok`.
    pub fn relay_move(&mut self, relay_move: RelayMove) -> BridgeResult<()> {
        self.send(EngineCommand::OpponentMove(relay_move))?;
        self.state = HandshakeState::AwaitingAck;
        self.await_ack()
    }

    /// Ask for a move within `budget_ms`. Follow with `await_result`.
    pub fn start_search(&mut self, budget_ms: u64) -> BridgeResult<()> {
        self.send(EngineCommand::Start { budget_ms })?;
        self.state = HandshakeState::Searching;
        Ok(())
    }

    /// Read status lines until `stop`; the last other non-empty line is the
    /// result line and must end in a move token.
    pub fn await_result(&mut self) -> BridgeResult<RelayMove> {
        let deadline = self.settings.result_timeout.map(|t| Instant::now() + t);
        let mut result_line: Option<String> = None;

        loop {
            let line = self.next_line(deadline, "engine result")?;
            if line == STOP {
                break;
            }
            debug!("engine: {line}");
            result_line = Some(line);
        }
        self.state = HandshakeState::Idle;

        let line = result_line
            .ok_or_else(|| BridgeError::MalformedResult("no result before stop".to_owned()))?;
        let relay_move = parse_result_line(&line)?;
        info!("engine chose {relay_move} ({line})");
        Ok(relay_move)
    }

    /// Close the link. Later commands fail with the link's error.
    pub fn close(&mut self) -> BridgeResult<()> {
        self.state = HandshakeState::Idle;
        self.link.close()
    }

    fn send(&mut self, command: EngineCommand) -> BridgeResult<()> {
        debug!("-> {command}");
        self.link.send(&command.to_wire())
    }

    fn await_ack(&mut self) -> BridgeResult<()> {
        let deadline = self.settings.ack_timeout.map(|t| Instant::now() + t);
        loop {
            let line = self.next_line(deadline, "engine acknowledgment")?;
            if line == ACK {
                self.state = HandshakeState::Idle;
                return Ok(());
            }
            debug!("discarding {line:?} while waiting for {ACK}");
        }
    }

    fn next_line(
        &mut self,
        deadline: Option<Instant>,
        waiting_for: &'static str,
    ) -> BridgeResult<String> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Ok(line);
            }
            if let Some(token) = self.framer.take_bare_token() {
                return Ok(token);
            }

            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(BridgeError::Timeout { waiting_for });
                    }
                    Some(deadline - now)
                }
                None => None,
            };

            let chunk = self
                .link
                .receive(self.settings.buffer_size, remaining)
                .map_err(|err| match err {
                    BridgeError::Timeout { .. } => BridgeError::Timeout { waiting_for },
                    other => other,
                })?;
            self.pending.extend(self.framer.push(&chunk));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ChannelSettings, EngineChannel, HandshakeState};
    use crate::board::bridge_types::{PromotionPiece, RelayMove};
    use crate::bridge_errors::BridgeError;
    use crate::channel::engine_link::MESSAGE_BUFFER_SIZE;
    use crate::harness::scripted_link::ScriptedLink;

    fn channel(incoming: &[&str]) -> EngineChannel<ScriptedLink> {
        EngineChannel::new(ScriptedLink::new(incoming), ChannelSettings::default())
    }

    #[test]
    fn stop_discards_noise_until_ok() {
        let mut channel = channel(&["info depth 4\n", "okay\n", "ok"]);
        channel.stop().expect("stop should be acknowledged");
        assert_eq!(channel.state(), HandshakeState::Idle);
        assert_eq!(channel.link().sent_lines(), vec!["stop"]);
    }

    #[test]
    fn relay_sends_triplet_and_waits() {
        let mut channel = channel(&["ok"]);
        channel
            .relay_move(RelayMove::new(55, 63, PromotionPiece::Queen))
            .expect("relay should be acknowledged");
        assert_eq!(channel.link().sent_lines(), vec!["55,63,q"]);
    }

    #[test]
    fn ponder_does_not_wait() {
        let mut channel = channel(&[]);
        channel.ponder().expect("ponder should send");
        assert_eq!(channel.state(), HandshakeState::Pondering);
    }

    #[test]
    fn result_is_last_line_before_stop() {
        let mut channel = channel(&[
            "info depth 1 pv d7d5\n",
            "info depth 2 pv e7e5\nbestmove e7e5\n",
            "stop\n",
        ]);
        channel.start_search(2_500).expect("start should send");
        assert_eq!(channel.state(), HandshakeState::Searching);
        let mv = channel.await_result().expect("result should parse");
        assert_eq!(mv, RelayMove::quiet(51, 35));
        assert_eq!(channel.state(), HandshakeState::Idle);
        assert_eq!(channel.link().sent_lines(), vec!["start 2500L"]);
    }

    #[test]
    fn stop_without_result_is_malformed() {
        let mut channel = channel(&["stop"]);
        channel.start_search(100).expect("start should send");
        assert!(matches!(
            channel.await_result(),
            Err(BridgeError::MalformedResult(_))
        ));
    }

    #[test]
    fn garbage_result_is_malformed() {
        let mut channel = channel(&["bestmove (none)\n", "stop\n"]);
        channel.start_search(100).expect("start should send");
        assert!(matches!(
            channel.await_result(),
            Err(BridgeError::MalformedResult(_))
        ));
    }

    #[test]
    fn result_line_split_across_reads_is_reassembled() {
        let mut channel = channel(&["info depth 1\nbestmove e7", "e5\nstop\n"]);
        channel.start_search(100).expect("start should send");
        let mv = channel.await_result().expect("split result should parse");
        assert_eq!(mv, RelayMove::quiet(51, 35));
    }

    #[test]
    fn ack_split_across_reads_is_reassembled() {
        let mut channel = channel(&["o", "k\n"]);
        channel.stop().expect("split ok should be acknowledged");
        assert_eq!(channel.state(), HandshakeState::Idle);
    }

    #[test]
    fn stop_split_by_the_read_buffer_ends_the_result() {
        // One info line long enough that "stop" straddles the 1024-byte read.
        let prefix_len = "info string \n".len() + "bestmove e7e5\n".len() + "st".len();
        let filler = "x".repeat(MESSAGE_BUFFER_SIZE - prefix_len);
        let stream = format!("info string {filler}\nbestmove e7e5\nstop\n");
        assert_eq!(&stream[MESSAGE_BUFFER_SIZE - 2..MESSAGE_BUFFER_SIZE], "st");

        let settings = ChannelSettings {
            result_timeout: Some(Duration::from_millis(50)),
            ..ChannelSettings::default()
        };
        let mut channel = EngineChannel::new(ScriptedLink::new(&[&stream]), settings);
        channel.start_search(100).expect("start should send");
        let mv = channel.await_result().expect("split stop should end the result");
        assert_eq!(mv, RelayMove::quiet(51, 35));
    }

    #[test]
    fn bare_token_waits_behind_complete_lines() {
        let mut channel = channel(&["info depth 3\nbestmove d7d5\nstop"]);
        channel.start_search(100).expect("start should send");
        let mv = channel.await_result().expect("bare stop should end the result");
        assert_eq!(mv, RelayMove::quiet(52, 36));
    }

    #[test]
    fn closed_link_surfaces_while_waiting() {
        let mut channel = channel(&["info"]);
        assert!(matches!(channel.stop(), Err(BridgeError::ConnectionClosed)));
    }

    #[test]
    fn ack_timeout_is_reported() {
        let settings = ChannelSettings {
            ack_timeout: Some(Duration::ZERO),
            ..ChannelSettings::default()
        };
        let mut channel = EngineChannel::new(ScriptedLink::stalled(), settings);
        assert!(matches!(
            channel.stop(),
            Err(BridgeError::Timeout {
                waiting_for: "engine acknowledgment"
            })
        ));
    }
}
