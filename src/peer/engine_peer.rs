//! Engine side of the bridge protocol.
//!
//! Connects to the bridge, reads one command per line and routes it to an
//! `Engine`. `stop` and move triplets are answered with `ok`; `start <ms>L`
//! is answered with the engine's status lines, `bestmove <move>` and a final
//! `stop`. The loop ends normally when the bridge closes the connection.

use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::board::bridge_types::RelayMove;
use crate::bridge_errors::{BridgeError, BridgeResult};
use crate::channel::engine_link::{EngineLink, MESSAGE_BUFFER_SIZE};
use crate::channel::wire_protocol::{
    format_move_token, parse_command, EngineCommand, LineBuffer, ACK, STOP,
};
use crate::peer::engine_trait::{Engine, SearchParams};

/// Result token sent when the engine has no move to offer.
const NULL_MOVE: &str = "0000";

/// What the peer saw before the bridge hung up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerSummary {
    pub commands_handled: u32,
    pub relayed: Vec<RelayMove>,
    pub played: Vec<RelayMove>,
}

/// Serves one bridge connection with an `Engine`.
pub struct EnginePeer<L: EngineLink, E: Engine> {
    link: L,
    engine: E,
    framer: LineBuffer,
    pending: VecDeque<String>,
    summary: PeerSummary,
}

impl<L: EngineLink, E: Engine> EnginePeer<L, E> {
    /// Start a new game on `engine` and wait for commands on `link`.
    pub fn new(link: L, mut engine: E) -> Self {
        engine.new_game();
        Self {
            link,
            engine,
            framer: LineBuffer::new(),
            pending: VecDeque::new(),
            summary: PeerSummary::default(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Serve commands until the bridge disconnects.
    pub fn serve(&mut self) -> BridgeResult<PeerSummary> {
        loop {
            let line = match self.next_line() {
                Ok(line) => line,
                Err(BridgeError::ConnectionClosed) => {
                    info!("bridge disconnected after {} commands", self.summary.commands_handled);
                    if self.framer.carried_len() > 0 {
                        debug!("dropping {} unterminated bytes", self.framer.carried_len());
                    }
                    if let Err(err) = self.link.close() {
                        warn!("closing engine link failed: {err}");
                    }
                    return Ok(self.summary.clone());
                }
                Err(err) => return Err(err),
            };

            match parse_command(&line) {
                Ok(command) => self.handle_command(command)?,
                Err(err) => warn!("ignoring {line:?}: {err}"),
            }
        }
    }

    fn handle_command(&mut self, command: EngineCommand) -> BridgeResult<()> {
        debug!("<- {command}");
        self.summary.commands_handled += 1;
        match command {
            EngineCommand::Ponder => self.engine.ponder(),
            EngineCommand::Stop => self.engine.stop(),
            EngineCommand::OpponentMove(relay_move) => {
                self.engine.opponent_moved(relay_move)?;
                self.summary.relayed.push(relay_move);
            }
            EngineCommand::Start { budget_ms } => {
                let output = self.engine.choose_move(&SearchParams { budget_ms })?;
                for line in &output.info_lines {
                    self.send_line(line)?;
                }
                match output.best_move {
                    Some(best) => {
                        self.send_line(&format!("bestmove {}", format_move_token(best)?))?;
                        self.summary.played.push(best);
                    }
                    None => self.send_line(&format!("bestmove {NULL_MOVE}"))?,
                }
                self.send_line(STOP)?;
            }
        }
        if command.expects_ack() {
            self.send_line(ACK)?;
        }
        Ok(())
    }

    fn send_line(&mut self, line: &str) -> BridgeResult<()> {
        self.link.send(format!("{line}\n").as_bytes())
    }

    fn next_line(&mut self) -> BridgeResult<String> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Ok(line);
            }
            if let Some(token) = self.framer.take_bare_token() {
                return Ok(token);
            }
            let chunk = self.link.receive(MESSAGE_BUFFER_SIZE, None)?;
            self.pending.extend(self.framer.push(&chunk));
        }
    }
}
