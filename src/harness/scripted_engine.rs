//! `Engine` that plays a fixed list of moves, one per `start`.

use std::collections::VecDeque;

use crate::board::bridge_types::RelayMove;
use crate::bridge_errors::BridgeResult;
use crate::peer::engine_trait::{Engine, EngineOutput, SearchParams};

#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    moves: VecDeque<RelayMove>,
    opponent_moves: Vec<RelayMove>,
    budgets: Vec<u64>,
    pondering: bool,
}

impl ScriptedEngine {
    pub fn new(moves: Vec<RelayMove>) -> Self {
        Self {
            moves: moves.into(),
            ..Self::default()
        }
    }

    pub fn opponent_moves(&self) -> &[RelayMove] {
        &self.opponent_moves
    }

    /// Budgets received, in order.
    pub fn budgets(&self) -> &[u64] {
        &self.budgets
    }

    pub fn is_pondering(&self) -> bool {
        self.pondering
    }
}

impl Engine for ScriptedEngine {
    fn opponent_moved(&mut self, relay_move: RelayMove) -> BridgeResult<()> {
        self.opponent_moves.push(relay_move);
        Ok(())
    }

    fn ponder(&mut self) {
        self.pondering = true;
    }

    fn stop(&mut self) {
        self.pondering = false;
    }

    fn choose_move(&mut self, params: &SearchParams) -> BridgeResult<EngineOutput> {
        self.budgets.push(params.budget_ms);
        Ok(EngineOutput {
            best_move: self.moves.pop_front(),
            info_lines: vec![format!("info string budget {} ms", params.budget_ms)],
        })
    }
}
