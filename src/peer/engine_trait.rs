//! Engine abstraction behind the engine side of the bridge protocol.
//!
//! The peer loop owns the socket; an `Engine` only tracks the game from the
//! relayed opponent moves and picks a reply when asked.

use crate::board::bridge_types::RelayMove;
use crate::bridge_errors::BridgeResult;

/// Limits for one `choose_move` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchParams {
    /// Time allowed for this move, from `start <ms>L`.
    pub budget_ms: u64,
}

/// What a search produced.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    /// `None` is reported to the bridge as the null move.
    pub best_move: Option<RelayMove>,
    /// Status lines streamed before the result line.
    pub info_lines: Vec<String>,
}

/// A move source driven by `EnginePeer`.
pub trait Engine: Send {
    /// Reset to the initial position.
    fn new_game(&mut self) {}

    /// The opponent played `relay_move` on the page.
    fn opponent_moved(&mut self, relay_move: RelayMove) -> BridgeResult<()>;

    /// Opponent is thinking. Speculative work may start here.
    fn ponder(&mut self) {}

    /// Abandon any speculative work.
    fn stop(&mut self) {}

    /// Pick our move within `params.budget_ms`.
    fn choose_move(&mut self, params: &SearchParams) -> BridgeResult<EngineOutput>;
}
