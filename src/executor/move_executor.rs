//! Replays an engine move on the page.

use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::board::bridge_types::{RelayMove, Side};
use crate::board::coordinate_mapper::engine_index_to_ui_identifier;
use crate::bridge_errors::{BridgeError, BridgeResult};
use crate::ui::ui_driver::{Selector, UiDriver};
use crate::ui::ui_vocabulary::UiVocabulary;

/// Pause after the last click before the page is read again.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct MoveExecutor {
    vocabulary: UiVocabulary,
    settle_delay: Duration,
}

impl MoveExecutor {
    pub fn new(vocabulary: UiVocabulary, settle_delay: Duration) -> Self {
        Self {
            vocabulary,
            settle_delay,
        }
    }

    /// Click origin, click destination at its center, pick the promotion
    /// piece if any, then wait for the page to settle. Any element that
    /// cannot be found aborts the move with `ElementNotFound`.
    pub fn execute<D: UiDriver>(
        &self,
        driver: &mut D,
        relay_move: RelayMove,
        side: Side,
    ) -> BridgeResult<()> {
        let board = driver.find_element(&Selector::class(self.vocabulary.board_class.as_str()))?;

        let from_token = engine_index_to_ui_identifier(relay_move.from, &self.vocabulary.square_prefix)?;
        let from = driver.find_element_in(&board, &Selector::class(from_token.as_str()))?;
        driver.click(&from)?;

        let to_token = engine_index_to_ui_identifier(relay_move.to, &self.vocabulary.square_prefix)?;
        let to = driver.find_element_in(&board, &Selector::class(to_token.as_str()))?;
        driver.click_at_offset(&to, 0, 0)?;
        debug!("clicked {from_token} then {to_token}");

        if let Some(letter) = relay_move.promotion.letter() {
            let window = driver.find_element_in(
                &board,
                &Selector::class(self.vocabulary.promotion_window_class.as_str()),
            )?;
            let token = format!("{}{}", side.piece_prefix(), letter);
            let piece = driver
                .find_element_in(&window, &Selector::class(token.as_str()))
                .map_err(|err| match err {
                    BridgeError::ElementNotFound { .. } => {
                        BridgeError::element_not_found(format!("promotion choice {token}"))
                    }
                    other => other,
                })?;
            driver.click(&piece)?;
            debug!("picked promotion {token}");
        }

        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }
        info!("played {relay_move}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::MoveExecutor;
    use crate::board::bridge_types::{PromotionPiece, RelayMove, Side};
    use crate::bridge_errors::BridgeError;
    use crate::harness::scripted_board::ScriptedBoard;
    use crate::ui::ui_vocabulary::UiVocabulary;

    fn executor() -> MoveExecutor {
        MoveExecutor::new(UiVocabulary::default(), Duration::ZERO)
    }

    #[test]
    fn quiet_move_clicks_origin_then_destination_center() {
        let mut page = ScriptedBoard::game(Side::FirstPlayer, "5:00", Vec::new());
        let transcript = page.transcript();
        executor()
            .execute(&mut page, RelayMove::quiet(11, 27), Side::FirstPlayer)
            .expect("move should execute");

        let transcript = transcript.lock().expect("transcript lock");
        assert_eq!(transcript.clicks.len(), 2);
        assert!(transcript.clicks[0].classes.contains("square-52"));
        assert_eq!(transcript.clicks[0].offset, None);
        assert!(transcript.clicks[1].classes.contains("square-54"));
        assert_eq!(transcript.clicks[1].offset, Some((0, 0)));
        assert_eq!(transcript.own_moves.len(), 1);
    }

    #[test]
    fn promotion_clicks_side_specific_piece() {
        let mut page = ScriptedBoard::game(Side::FirstPlayer, "5:00", Vec::new());
        let transcript = page.transcript();
        // g7 to g8
        executor()
            .execute(
                &mut page,
                RelayMove::new(49, 57, PromotionPiece::Knight),
                Side::FirstPlayer,
            )
            .expect("promotion should execute");

        let transcript = transcript.lock().expect("transcript lock");
        assert_eq!(transcript.clicks.len(), 3);
        assert!(transcript.clicks[2].classes.ends_with("wn"));
        assert_eq!(
            transcript.own_moves[0].promotion_token.as_deref(),
            Some("wn")
        );
    }

    #[test]
    fn second_player_promotes_with_black_prefix() {
        let mut page = ScriptedBoard::game(Side::FirstPlayer, "5:00", Vec::new());
        let transcript = page.transcript();
        executor()
            .execute(
                &mut page,
                RelayMove::new(9, 1, PromotionPiece::Queen),
                Side::SecondPlayer,
            )
            .expect("promotion should execute");
        let transcript = transcript.lock().expect("transcript lock");
        assert!(transcript.clicks[2].classes.ends_with("bq"));
    }

    #[test]
    fn missing_square_is_fatal() {
        let mut page = ScriptedBoard::new();
        page.add_element("board", "");
        let result = executor().execute(&mut page, RelayMove::quiet(11, 27), Side::FirstPlayer);
        assert!(matches!(result, Err(BridgeError::ElementNotFound { .. })));
    }
}
