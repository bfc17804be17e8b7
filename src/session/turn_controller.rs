//! The per-ply loop: wait for the opponent, relay, budget, search, execute.
//!
//! `TurnController` is the only owner of cross-ply state (`TurnState`). Every
//! step returns a `BridgeResult`; `run` stops at the first error and hands it
//! back so the session can tear down.

use std::time::Duration;

use log::{debug, info};

use crate::board::bridge_types::{ObservedMove, RelayMove, Side, TurnState};
use crate::bridge_errors::{BridgeError, BridgeResult};
use crate::channel::engine_channel::EngineChannel;
use crate::channel::engine_link::EngineLink;
use crate::executor::move_executor::{MoveExecutor, DEFAULT_SETTLE_DELAY};
use crate::observer::board_observer::BoardObserver;
use crate::observer::move_evidence::{HighlightPieceInterpreter, MoveEvidenceInterpreter};
use crate::observer::poll_policy::PollPolicy;
use crate::session::time_budget::{clock_text_to_ms, TimeBudgetPolicy};
use crate::ui::ui_driver::{Selector, UiDriver};
use crate::ui::ui_vocabulary::UiVocabulary;

/// Step of the ply loop, kept so a failure can be attributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitOpponent,
    Relay,
    ComputeBudget,
    DispatchSearch,
    AwaitResult,
    Execute,
}

/// What happened during one full ply pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlyReport {
    pub observed: ObservedMove,
    pub budget_ms: u64,
    pub played: RelayMove,
}

/// Drives one game from a known side, ply by ply.
pub struct TurnController<D: UiDriver, L: EngineLink, I = HighlightPieceInterpreter> {
    driver: D,
    channel: EngineChannel<L>,
    observer: BoardObserver<I>,
    executor: MoveExecutor,
    vocabulary: UiVocabulary,
    budget: TimeBudgetPolicy,
    turn: TurnState,
    phase: TurnPhase,
}

impl<D: UiDriver, L: EngineLink> TurnController<D, L> {
    /// Controller for `side` at move 0, observing with the highlight
    /// interpreter and the default budget policy and settle delay.
    pub fn new(
        driver: D,
        channel: EngineChannel<L>,
        side: Side,
        vocabulary: UiVocabulary,
        poll: PollPolicy,
    ) -> Self {
        Self {
            driver,
            channel,
            observer: BoardObserver::new(vocabulary.clone(), poll),
            executor: MoveExecutor::new(vocabulary.clone(), DEFAULT_SETTLE_DELAY),
            vocabulary,
            budget: TimeBudgetPolicy::default(),
            turn: TurnState::new(side),
            phase: TurnPhase::AwaitOpponent,
        }
    }
}

impl<D: UiDriver, L: EngineLink, I: MoveEvidenceInterpreter> TurnController<D, L, I> {
    /// Swap the observer, e.g. to plug in another evidence interpreter.
    pub fn with_observer<J: MoveEvidenceInterpreter>(
        self,
        observer: BoardObserver<J>,
    ) -> TurnController<D, L, J> {
        TurnController {
            driver: self.driver,
            channel: self.channel,
            observer,
            executor: self.executor,
            vocabulary: self.vocabulary,
            budget: self.budget,
            turn: self.turn,
            phase: self.phase,
        }
    }

    pub fn budget_policy(mut self, budget: TimeBudgetPolicy) -> Self {
        self.budget = budget;
        self
    }

    /// Pause after each executed move before the page is read again.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.executor = MoveExecutor::new(self.vocabulary.clone(), delay);
        self
    }

    pub fn turn(&self) -> TurnState {
        self.turn
    }

    /// Phase of the step currently running, or of the step that failed.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn channel(&self) -> &EngineChannel<L> {
        &self.channel
    }

    /// The page, between plies.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give back the collaborators for teardown.
    pub fn into_parts(self) -> (D, EngineChannel<L>) {
        (self.driver, self.channel)
    }

    /// Let the engine ponder while the opponent thinks, then stop it.
    pub fn await_opponent(&mut self) -> BridgeResult<ObservedMove> {
        self.phase = TurnPhase::AwaitOpponent;
        self.channel.ponder()?;
        let observed = self.observer.observe(&mut self.driver)?;
        self.channel.stop()?;
        Ok(observed)
    }

    /// Pass the opponent's move on. Nothing is sent for `NoMove`.
    pub fn relay(&mut self, observed: ObservedMove) -> BridgeResult<()> {
        self.phase = TurnPhase::Relay;
        match observed {
            ObservedMove::Move(relay_move) => {
                self.channel.relay_move(relay_move)?;
                self.turn.complete_ply();
                debug!("relayed {relay_move}, move number {}", self.turn.move_number);
            }
            ObservedMove::NoMove => debug!("nothing to relay"),
        }
        Ok(())
    }

    /// Read our clock and turn it into a search budget for this ply.
    pub fn compute_budget(&mut self) -> BridgeResult<u64> {
        self.phase = TurnPhase::ComputeBudget;
        let clock = self
            .driver
            .find_element(&Selector::css(self.vocabulary.clock_text_css.as_str()))?;
        let text = self.driver.read_text(&clock)?;
        let remaining_ms = clock_text_to_ms(&text)?;
        let budget_ms = self.budget.budget_ms(remaining_ms, self.turn.move_number);
        debug!(
            "clock {text:?} = {remaining_ms} ms at move {}, budget {budget_ms} ms",
            self.turn.move_number
        );
        Ok(budget_ms)
    }

    pub fn dispatch_search(&mut self, budget_ms: u64) -> BridgeResult<()> {
        self.phase = TurnPhase::DispatchSearch;
        self.channel.start_search(budget_ms)
    }

    pub fn await_result(&mut self) -> BridgeResult<RelayMove> {
        self.phase = TurnPhase::AwaitResult;
        self.channel.await_result()
    }

    /// Play the engine's move on the page.
    pub fn execute(&mut self, relay_move: RelayMove) -> BridgeResult<()> {
        self.phase = TurnPhase::Execute;
        self.executor
            .execute(&mut self.driver, relay_move, self.turn.side)?;
        self.turn.complete_ply();
        Ok(())
    }

    /// One opponent ply (possibly none) followed by one own ply.
    pub fn play_ply(&mut self) -> BridgeResult<PlyReport> {
        let observed = self.await_opponent()?;
        self.relay(observed)?;
        let budget_ms = self.compute_budget()?;
        self.dispatch_search(budget_ms)?;
        let played = self.await_result()?;
        self.execute(played)?;
        info!(
            "move {} done: played {played} with {budget_ms} ms",
            self.turn.move_number
        );
        Ok(PlyReport {
            observed,
            budget_ms,
            played,
        })
    }

    /// Play until a step fails and return that error.
    pub fn run(&mut self) -> BridgeError {
        loop {
            if let Err(err) = self.play_ply() {
                return err;
            }
        }
    }
}
