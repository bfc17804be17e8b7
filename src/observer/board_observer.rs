//! Opponent-move detection.
//!
//! One observation per ply: wait until the own clock carries the turn marker
//! (the opponent has finished), then read the highlighted squares and hand
//! the last two to the evidence interpreter. No highlights at all means no
//! move has been played yet (we open the game).

use log::{debug, info};

use crate::board::bridge_types::ObservedMove;
use crate::bridge_errors::BridgeResult;
use crate::observer::move_evidence::{HighlightPieceInterpreter, MoveEvidenceInterpreter};
use crate::observer::poll_policy::{poll_until, PollPolicy};
use crate::ui::ui_driver::{class_tokens, Selector, UiDriver};
use crate::ui::ui_vocabulary::UiVocabulary;

/// Phases of a single observation, exposed for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverPhase {
    WaitingTurnFlip,
    EvidenceCollected,
    NoMove,
}

#[derive(Debug, Clone)]
pub struct BoardObserver<I = HighlightPieceInterpreter> {
    vocabulary: UiVocabulary,
    turn_poll: PollPolicy,
    evidence_poll: PollPolicy,
    interpreter: I,
    phase: ObserverPhase,
}

impl BoardObserver<HighlightPieceInterpreter> {
    pub fn new(vocabulary: UiVocabulary, poll: PollPolicy) -> Self {
        Self::with_interpreter(vocabulary, poll, HighlightPieceInterpreter)
    }
}

impl<I: MoveEvidenceInterpreter> BoardObserver<I> {
    pub fn with_interpreter(vocabulary: UiVocabulary, poll: PollPolicy, interpreter: I) -> Self {
        Self {
            vocabulary,
            turn_poll: poll,
            evidence_poll: poll,
            interpreter,
            phase: ObserverPhase::NoMove,
        }
    }

    /// Policy for re-reading highlights when fewer than two are present.
    pub fn evidence_poll(mut self, poll: PollPolicy) -> Self {
        self.evidence_poll = poll;
        self
    }

    pub fn phase(&self) -> ObserverPhase {
        self.phase
    }

    /// Block until the opponent has moved and report what they played.
    pub fn observe<D: UiDriver>(&mut self, driver: &mut D) -> BridgeResult<ObservedMove> {
        self.phase = ObserverPhase::WaitingTurnFlip;
        self.await_turn_flip(driver)?;
        debug!("turn marker seen, collecting highlights");

        let highlight = Selector::class(self.vocabulary.highlight_class.as_str());
        let mut highlighted = driver.find_elements(&highlight)?;
        if highlighted.is_empty() {
            self.phase = ObserverPhase::NoMove;
            info!("no highlighted squares, nothing to relay");
            return Ok(ObservedMove::NoMove);
        }

        if highlighted.len() < 2 {
            // Page is mid-update; one endpoint is drawn already.
            highlighted = poll_until(&self.evidence_poll, "second highlight", || {
                let current = driver.find_elements(&highlight)?;
                Ok((current.len() >= 2).then_some(current))
            })?;
        }

        let last_two = &highlighted[highlighted.len() - 2..];
        let relay_move =
            self.interpreter
                .interpret(driver, &self.vocabulary, &last_two[0], &last_two[1])?;
        self.phase = ObserverPhase::EvidenceCollected;
        info!("opponent played {relay_move}");
        Ok(ObservedMove::Move(relay_move))
    }

    fn await_turn_flip<D: UiDriver>(&self, driver: &mut D) -> BridgeResult<()> {
        let clock = Selector::class(self.vocabulary.clock_class.as_str());
        let marker = self.vocabulary.turn_marker.as_str();
        poll_until(&self.turn_poll, "opponent to finish their turn", || {
            let element = driver.find_element(&clock)?;
            let on_move = class_tokens(driver, &element)?
                .iter()
                .any(|token| token == marker);
            Ok(on_move.then_some(()))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{BoardObserver, ObserverPhase};
    use crate::board::bridge_types::{ObservedMove, PromotionPiece, RelayMove, Side};
    use crate::bridge_errors::BridgeError;
    use crate::harness::scripted_board::{ScriptedBoard, ScriptedReply};
    use crate::observer::poll_policy::PollPolicy;
    use crate::ui::ui_vocabulary::UiVocabulary;

    fn observer(timeout: Option<Duration>) -> BoardObserver {
        BoardObserver::new(UiVocabulary::default(), PollPolicy::immediate(timeout))
    }

    #[test]
    fn zero_highlights_reports_no_move() {
        let mut page = ScriptedBoard::game(Side::FirstPlayer, "5:00", Vec::new());
        let mut observer = observer(None);
        let observed = observer.observe(&mut page).expect("observation should succeed");
        assert_eq!(observed, ObservedMove::NoMove);
        assert_eq!(observer.phase(), ObserverPhase::NoMove);
    }

    #[test]
    fn opening_pawn_push_is_normalized() {
        let mut page = ScriptedBoard::game(
            Side::SecondPlayer,
            "5:00",
            vec![ScriptedReply::quiet(11, 27)],
        );
        let mut observer = observer(None);
        let observed = observer.observe(&mut page).expect("observation should succeed");
        assert_eq!(observed, ObservedMove::Move(RelayMove::quiet(11, 27)));
        assert_eq!(observer.phase(), ObserverPhase::EvidenceCollected);
    }

    #[test]
    fn stale_highlights_are_trimmed_to_last_two() {
        let mut page = ScriptedBoard::new();
        page.add_element("clock-bottom clock-player-turn", "");
        page.add_element("highlight square-71", "");
        page.add_element("highlight square-52", "");
        page.add_element("highlight square-54", "");
        page.add_element("piece wp square-54", "");
        let observed = observer(None).observe(&mut page).expect("observation should succeed");
        assert_eq!(observed, ObservedMove::Move(RelayMove::quiet(11, 27)));
    }

    #[test]
    fn promotion_is_read_from_destination_piece() {
        let mut page = ScriptedBoard::new();
        page.add_element("clock-bottom clock-player-turn", "");
        page.add_element("highlight square-17", "");
        page.add_element("highlight square-18", "");
        page.add_element("piece square-18 wq", "");
        let observed = observer(None).observe(&mut page).expect("observation should succeed");
        assert_eq!(
            observed,
            ObservedMove::Move(RelayMove::new(55, 63, PromotionPiece::Queen))
        );
    }

    #[test]
    fn missing_turn_marker_times_out() {
        let mut page = ScriptedBoard::new();
        page.add_element("clock-bottom", "");
        let result = observer(Some(Duration::ZERO)).observe(&mut page);
        assert!(matches!(result, Err(BridgeError::Timeout { .. })));
    }

    #[test]
    fn single_highlight_waits_for_the_second() {
        let mut page = ScriptedBoard::new();
        page.add_element("clock-bottom clock-player-turn", "");
        page.add_element("highlight square-52", "");
        let result = observer(Some(Duration::from_millis(5))).observe(&mut page);
        assert!(matches!(result, Err(BridgeError::Timeout { .. })));
    }
}
