//! Core value types shared by the observer, the executor and the engine
//! channel. Everything here is `Copy` and lives for at most one ply.

use std::fmt;

/// Engine square index (`0..=63`). Engine file 0 is the h-file.
pub type EngineSquare = u8;

/// Which seat this bridge plays. Fixed once from the board orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    FirstPlayer,
    SecondPlayer,
}

impl Side {
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::FirstPlayer => Side::SecondPlayer,
            Side::SecondPlayer => Side::FirstPlayer,
        }
    }

    /// Color prefix the UI uses in piece tokens (`wq`, `bn`, ...).
    #[inline]
    pub const fn piece_prefix(self) -> char {
        match self {
            Side::FirstPlayer => 'w',
            Side::SecondPlayer => 'b',
        }
    }
}

/// Promotion choice carried by a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromotionPiece {
    #[default]
    None,
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl PromotionPiece {
    /// Lowercase piece letter, `None` for no promotion.
    #[inline]
    pub const fn letter(self) -> Option<char> {
        match self {
            PromotionPiece::None => None,
            PromotionPiece::Queen => Some('q'),
            PromotionPiece::Rook => Some('r'),
            PromotionPiece::Bishop => Some('b'),
            PromotionPiece::Knight => Some('n'),
        }
    }

    /// Accepts either case. Anything that is not a promotable piece maps to
    /// `None`, which callers treat as "not a promotion".
    #[inline]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'q' => Some(PromotionPiece::Queen),
            'r' => Some(PromotionPiece::Rook),
            'b' => Some(PromotionPiece::Bishop),
            'n' => Some(PromotionPiece::Knight),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        !matches!(self, PromotionPiece::None)
    }
}

/// One ply, in engine-index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayMove {
    pub from: EngineSquare,
    pub to: EngineSquare,
    pub promotion: PromotionPiece,
}

impl RelayMove {
    pub const fn new(from: EngineSquare, to: EngineSquare, promotion: PromotionPiece) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }

    pub const fn quiet(from: EngineSquare, to: EngineSquare) -> Self {
        Self::new(from, to, PromotionPiece::None)
    }
}

impl fmt::Display for RelayMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.promotion.letter() {
            Some(letter) => write!(f, "{}->{}={}", self.from, self.to, letter),
            None => write!(f, "{}->{}", self.from, self.to),
        }
    }
}

/// Result of one observation of the opponent's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedMove {
    Move(RelayMove),
    /// No highlighted squares: nothing has been played yet.
    NoMove,
}

/// Cross-ply state, owned by the turn controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnState {
    pub move_number: u32,
    pub side: Side,
}

impl TurnState {
    pub const fn new(side: Side) -> Self {
        Self {
            move_number: 0,
            side,
        }
    }

    #[inline]
    pub fn complete_ply(&mut self) {
        self.move_number += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{PromotionPiece, RelayMove, Side, TurnState};

    #[test]
    fn promotion_letters_map_both_ways() {
        for piece in [
            PromotionPiece::Queen,
            PromotionPiece::Rook,
            PromotionPiece::Bishop,
            PromotionPiece::Knight,
        ] {
            let letter = piece.letter().expect("promotable piece should have a letter");
            assert_eq!(PromotionPiece::from_letter(letter), Some(piece));
        }
        assert_eq!(PromotionPiece::from_letter('Q'), Some(PromotionPiece::Queen));
        assert_eq!(PromotionPiece::from_letter('k'), None);
        assert_eq!(PromotionPiece::None.letter(), None);
    }

    #[test]
    fn side_prefix_follows_seat() {
        assert_eq!(Side::FirstPlayer.piece_prefix(), 'w');
        assert_eq!(Side::SecondPlayer.piece_prefix(), 'b');
        assert_eq!(Side::FirstPlayer.opposite(), Side::SecondPlayer);
    }

    #[test]
    fn turn_state_counts_plies() {
        let mut state = TurnState::new(Side::SecondPlayer);
        state.complete_ply();
        state.complete_ply();
        assert_eq!(state.move_number, 2);
        assert_eq!(state.side, Side::SecondPlayer);
    }

    #[test]
    fn relay_move_display_includes_promotion() {
        assert_eq!(RelayMove::quiet(11, 27).to_string(), "11->27");
        assert_eq!(
            RelayMove::new(51, 59, PromotionPiece::Queen).to_string(),
            "51->59=q"
        );
    }
}
