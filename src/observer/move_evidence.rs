//! Interpretation of the two highlighted squares left by the last move.
//!
//! The page highlights both endpoints of the last move but does not say which
//! one is the origin. `MoveEvidenceInterpreter` isolates that decision so the
//! polling and protocol code never depend on a particular page layout.

use log::debug;

use crate::board::bridge_types::{PromotionPiece, RelayMove};
use crate::board::coordinate_mapper::ui_identifier_to_index;
use crate::bridge_errors::{BridgeError, BridgeResult};
use crate::ui::ui_driver::{class_tokens, Selector, UiDriver};
use crate::ui::ui_vocabulary::UiVocabulary;

pub trait MoveEvidenceInterpreter {
    /// Turn the last two highlighted elements (document order) into a move.
    fn interpret<D: UiDriver>(
        &self,
        driver: &mut D,
        vocabulary: &UiVocabulary,
        first: &D::Element,
        second: &D::Element,
    ) -> BridgeResult<RelayMove>;
}

/// Destination is the highlighted square that now holds a piece.
///
/// If the first highlight's square has no piece element, the first highlight
/// is the origin and the second the destination; otherwise the reverse.
/// Promotion is read from the destination piece's last class token: a
/// two-letter token (color + piece) names the promoted piece.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightPieceInterpreter;

impl MoveEvidenceInterpreter for HighlightPieceInterpreter {
    fn interpret<D: UiDriver>(
        &self,
        driver: &mut D,
        vocabulary: &UiVocabulary,
        first: &D::Element,
        second: &D::Element,
    ) -> BridgeResult<RelayMove> {
        let first_square = square_class(driver, first)?;
        let first_occupied =
            piece_on_square(driver, vocabulary, &first_square)?.is_some();

        let (from_element, to_element) = if first_occupied {
            (second, first)
        } else {
            (first, second)
        };

        let from = ui_identifier_to_index(&driver.attribute(from_element, "class")?)?;
        let to = ui_identifier_to_index(&driver.attribute(to_element, "class")?)?;

        let to_square = square_class(driver, to_element)?;
        let piece = piece_on_square(driver, vocabulary, &to_square)?.ok_or_else(|| {
            BridgeError::element_not_found(format!("{} on {}", vocabulary.piece_class, to_square))
        })?;
        let promotion = promotion_from_piece_tokens(&class_tokens(driver, &piece)?);

        Ok(RelayMove::new(from, to, promotion))
    }
}

/// Last class token, which names the square (`square-54`).
fn square_class<D: UiDriver>(driver: &mut D, element: &D::Element) -> BridgeResult<String> {
    class_tokens(driver, element)?
        .pop()
        .ok_or_else(|| BridgeError::InvalidSquare(format!("{element:?} has no class")))
}

fn piece_on_square<D: UiDriver>(
    driver: &mut D,
    vocabulary: &UiVocabulary,
    square: &str,
) -> BridgeResult<Option<D::Element>> {
    for element in driver.find_elements(&Selector::class(square))? {
        let tokens = class_tokens(driver, &element)?;
        if tokens.iter().any(|token| *token == vocabulary.piece_class) {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

fn promotion_from_piece_tokens(tokens: &[String]) -> PromotionPiece {
    let Some(last) = tokens.last() else {
        return PromotionPiece::None;
    };
    let mut letters = last.chars();
    match (letters.next(), letters.next(), letters.next()) {
        (Some(_color), Some(piece), None) => {
            let promotion = PromotionPiece::from_letter(piece).unwrap_or_default();
            if !promotion.is_promotion() {
                debug!("piece token {last:?} is not a promotion");
            }
            promotion
        }
        _ => PromotionPiece::None,
    }
}

#[cfg(test)]
mod tests {
    use super::{promotion_from_piece_tokens, HighlightPieceInterpreter, MoveEvidenceInterpreter};
    use crate::board::bridge_types::{PromotionPiece, RelayMove};
    use crate::bridge_errors::BridgeError;
    use crate::harness::scripted_board::ScriptedBoard;
    use crate::ui::ui_driver::{Selector, UiDriver};
    use crate::ui::ui_vocabulary::UiVocabulary;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| (*t).to_owned()).collect()
    }

    #[test]
    fn two_letter_piece_token_signals_promotion() {
        assert_eq!(
            promotion_from_piece_tokens(&tokens(&["piece", "square-58", "wq"])),
            PromotionPiece::Queen
        );
        assert_eq!(
            promotion_from_piece_tokens(&tokens(&["piece", "square-18", "bn"])),
            PromotionPiece::Knight
        );
        assert_eq!(
            promotion_from_piece_tokens(&tokens(&["piece", "wp", "square-54"])),
            PromotionPiece::None
        );
        assert_eq!(
            promotion_from_piece_tokens(&tokens(&["piece", "square-54", "wk"])),
            PromotionPiece::None
        );
    }

    fn interpret(board: &mut ScriptedBoard) -> Result<RelayMove, BridgeError> {
        let vocabulary = UiVocabulary::default();
        let highlights = board
            .find_elements(&Selector::class("highlight"))
            .expect("lookup should succeed");
        HighlightPieceInterpreter.interpret(board, &vocabulary, &highlights[0], &highlights[1])
    }

    #[test]
    fn origin_first_in_document_order() {
        let mut board = ScriptedBoard::new();
        board.add_element("highlight square-52", "");
        board.add_element("highlight square-54", "");
        board.add_element("piece wp square-54", "");
        let mv = interpret(&mut board).expect("evidence should interpret");
        assert_eq!(mv, RelayMove::quiet(11, 27));
    }

    #[test]
    fn destination_first_in_document_order() {
        let mut board = ScriptedBoard::new();
        board.add_element("highlight square-54", "");
        board.add_element("highlight square-52", "");
        board.add_element("piece wp square-54", "");
        let mv = interpret(&mut board).expect("evidence should interpret");
        assert_eq!(mv, RelayMove::quiet(11, 27));
    }

    #[test]
    fn missing_destination_piece_is_fatal() {
        let mut board = ScriptedBoard::new();
        board.add_element("highlight square-52", "");
        board.add_element("highlight square-54", "");
        assert!(matches!(
            interpret(&mut board),
            Err(BridgeError::ElementNotFound { .. })
        ));
    }
}
