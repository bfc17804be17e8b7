//! Text tokens exchanged with the engine and their parsers.
//!
//! Bridge → engine: `ponder`, `stop`, `<from>,<to>,<promo>`, `start <ms>L`.
//! Engine → bridge: `ok`, free-form status lines, a result line ending in a
//! long-algebraic move (`bestmove e7e5`), and `stop` once the search is over.
//! Every message is one line; surrounding whitespace is ignored.

use std::fmt;

use crate::board::bridge_types::{PromotionPiece, RelayMove};
use crate::board::coordinate_mapper::{algebraic_to_engine_index, engine_index_to_algebraic};
use crate::bridge_errors::{BridgeError, BridgeResult};

pub const ACK: &str = "ok";
pub const PONDER: &str = "ponder";
pub const STOP: &str = "stop";
pub const START: &str = "start";
/// Promotion field of a triplet when nothing is promoted.
pub const NO_PROMOTION: &str = "NONE";

/// A command sent by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    Ponder,
    Stop,
    OpponentMove(RelayMove),
    Start { budget_ms: u64 },
}

impl EngineCommand {
    /// Whether the engine answers this command with `ok`.
    pub const fn expects_ack(self) -> bool {
        matches!(self, EngineCommand::Stop | EngineCommand::OpponentMove(_))
    }

    /// Wire form including the line terminator.
    pub fn to_wire(self) -> Vec<u8> {
        format!("{self}\n").into_bytes()
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Ponder => f.write_str(PONDER),
            EngineCommand::Stop => f.write_str(STOP),
            EngineCommand::OpponentMove(mv) => match mv.promotion.letter() {
                Some(letter) => write!(f, "{},{},{}", mv.from, mv.to, letter),
                None => write!(f, "{},{},{}", mv.from, mv.to, NO_PROMOTION),
            },
            EngineCommand::Start { budget_ms } => write!(f, "{START} {budget_ms}L"),
        }
    }
}

/// Parse one command line on the engine side.
pub fn parse_command(line: &str) -> BridgeResult<EngineCommand> {
    let trimmed = line.trim();
    match trimmed {
        PONDER => return Ok(EngineCommand::Ponder),
        STOP => return Ok(EngineCommand::Stop),
        _ => {}
    }

    if let Some(rest) = trimmed.strip_prefix(START) {
        let digits = rest
            .trim()
            .strip_suffix('L')
            .ok_or_else(|| BridgeError::Protocol(format!("start without L suffix: {trimmed:?}")))?;
        let budget_ms = digits
            .parse::<u64>()
            .map_err(|_| BridgeError::Protocol(format!("invalid start budget: {trimmed:?}")))?;
        return Ok(EngineCommand::Start { budget_ms });
    }

    parse_triplet(trimmed).map(EngineCommand::OpponentMove)
}

/// Parse `"<from>,<to>,<NONE|letter>"`.
pub fn parse_triplet(text: &str) -> BridgeResult<RelayMove> {
    let fields = text.trim().split(',').collect::<Vec<_>>();
    if fields.len() != 3 {
        return Err(BridgeError::Protocol(format!("unknown command: {text:?}")));
    }

    let square = |field: &str| -> BridgeResult<u8> {
        let index = field
            .trim()
            .parse::<u8>()
            .map_err(|_| BridgeError::Protocol(format!("invalid square field {field:?}")))?;
        if index > 63 {
            return Err(BridgeError::InvalidSquare(index.to_string()));
        }
        Ok(index)
    };

    let from = square(fields[0])?;
    let to = square(fields[1])?;
    let promotion_field = fields[2].trim();
    let promotion = if promotion_field == NO_PROMOTION {
        PromotionPiece::None
    } else {
        let mut letters = promotion_field.chars();
        match (letters.next(), letters.next()) {
            (Some(letter), None) => PromotionPiece::from_letter(letter).ok_or_else(|| {
                BridgeError::Protocol(format!("invalid promotion {promotion_field:?}"))
            })?,
            _ => {
                return Err(BridgeError::Protocol(format!(
                    "invalid promotion {promotion_field:?}"
                )))
            }
        }
    };

    Ok(RelayMove::new(from, to, promotion))
}

/// Split a complete buffer into trimmed, non-empty lines.
///
/// Only for buffers known to hold whole messages, such as a transcript of
/// everything sent. Reads from a stream go through `LineBuffer`.
pub fn chunk_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Reassembles newline-terminated lines from reads split at arbitrary bytes.
///
/// Bytes after the last newline are carried over to the next `push`.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    partial: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a received chunk and return every line it completes, trimmed,
    /// with blank lines dropped.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.partial.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(end) = self.partial.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=end).collect();
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim();
            if !line.is_empty() {
                lines.push(line.to_owned());
            }
        }
        lines
    }

    /// Take the unterminated tail if it is exactly `ok` or `stop`.
    ///
    /// Peers that write one bare token per send never add the newline. Any
    /// other tail stays buffered until its newline arrives.
    pub fn take_bare_token(&mut self) -> Option<String> {
        let token = String::from_utf8_lossy(&self.partial).trim().to_owned();
        if token == ACK || token == STOP {
            self.partial.clear();
            Some(token)
        } else {
            None
        }
    }

    /// Bytes held back waiting for a newline.
    pub fn carried_len(&self) -> usize {
        self.partial.len()
    }
}

/// Whether `token` matches `[a-h][1-8][a-h][1-8][qrbn]?`.
pub fn is_move_token(token: &str) -> bool {
    let bytes = token.as_bytes();
    if bytes.len() != 4 && bytes.len() != 5 {
        return false;
    }
    let file = |b: u8| (b'a'..=b'h').contains(&b);
    let rank = |b: u8| (b'1'..=b'8').contains(&b);
    file(bytes[0])
        && rank(bytes[1])
        && file(bytes[2])
        && rank(bytes[3])
        && (bytes.len() == 4 || matches!(bytes[4], b'q' | b'r' | b'b' | b'n'))
}

/// Parse a long-algebraic move token (`e2e4`, `e7e8q`).
pub fn parse_move_token(token: &str) -> BridgeResult<RelayMove> {
    if !is_move_token(token) {
        return Err(BridgeError::MalformedResult(token.to_owned()));
    }

    let from = algebraic_to_engine_index(&token[0..2])?;
    let to = algebraic_to_engine_index(&token[2..4])?;
    let promotion = token[4..]
        .chars()
        .next()
        .and_then(PromotionPiece::from_letter)
        .unwrap_or_default();
    Ok(RelayMove::new(from, to, promotion))
}

/// The move is the last whitespace-separated field of the result line.
pub fn parse_result_line(line: &str) -> BridgeResult<RelayMove> {
    let token = line
        .split_whitespace()
        .last()
        .ok_or_else(|| BridgeError::MalformedResult(line.to_owned()))?;
    parse_move_token(token).map_err(|_| BridgeError::MalformedResult(line.to_owned()))
}

/// Long-algebraic form of a move, as the engine reports it.
pub fn format_move_token(relay_move: RelayMove) -> BridgeResult<String> {
    let mut out = engine_index_to_algebraic(relay_move.from)?;
    out.push_str(&engine_index_to_algebraic(relay_move.to)?);
    if let Some(letter) = relay_move.promotion.letter() {
        out.push(letter);
    }
    Ok(out)
}
