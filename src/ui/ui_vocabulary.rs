//! Class names and selectors the bridge looks for in the game page.

use crate::board::coordinate_mapper::DEFAULT_UI_SQUARE_PREFIX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiVocabulary {
    /// Board container; its class list carries `flipped_marker` when we play
    /// the second seat.
    pub board_class: String,
    pub flipped_marker: String,
    /// Own clock; its class list carries `turn_marker` while we are on move.
    pub clock_class: String,
    pub turn_marker: String,
    /// Element whose text is the own remaining time.
    pub clock_text_css: String,
    pub highlight_class: String,
    pub piece_class: String,
    pub square_prefix: String,
    pub promotion_window_class: String,
}

impl Default for UiVocabulary {
    fn default() -> Self {
        Self {
            board_class: "board".to_owned(),
            flipped_marker: "flipped".to_owned(),
            clock_class: "clock-bottom".to_owned(),
            turn_marker: "clock-player-turn".to_owned(),
            clock_text_css: "div.clock-bottom span".to_owned(),
            highlight_class: "highlight".to_owned(),
            piece_class: "piece".to_owned(),
            square_prefix: DEFAULT_UI_SQUARE_PREFIX.to_owned(),
            promotion_window_class: "promotion-window".to_owned(),
        }
    }
}
