//! Square conversions between engine indices, algebraic text and UI tokens.
//!
//! The engine numbers squares `0..=63` with file 0 on the h-file
//! (`index = rank * 8 + (7 - chess_file)`). The UI names squares with a class
//! token whose last two characters are the 1-based chess file and rank
//! (`square-54` is e4). All functions here are pure.

use crate::board::bridge_types::EngineSquare;
use crate::bridge_errors::{BridgeError, BridgeResult};

/// Class prefix the UI puts in front of the file/rank digits.
pub const DEFAULT_UI_SQUARE_PREFIX: &str = "square-";

/// Convert a UI square identifier (any string ending in `<file><rank>`
/// digits, for example a full class attribute `"highlight square-54"`) to an
/// engine index.
#[inline]
pub fn ui_identifier_to_index(identifier: &str) -> BridgeResult<EngineSquare> {
    let bytes = identifier.trim_end().as_bytes();
    if bytes.len() < 2 {
        return Err(BridgeError::InvalidSquare(identifier.to_owned()));
    }

    let file = bytes[bytes.len() - 2];
    let rank = bytes[bytes.len() - 1];
    if !(b'1'..=b'8').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(BridgeError::InvalidSquare(identifier.to_owned()));
    }

    let chess_file = file - b'0';
    let chess_rank = rank - b'0';
    Ok((chess_rank - 1) * 8 + (8 - chess_file))
}

/// Convert algebraic text (for example `"e4"`) to an engine index.
#[inline]
pub fn algebraic_to_engine_index(square: &str) -> BridgeResult<EngineSquare> {
    let bytes = square.as_bytes();
    if bytes.len() != 2 {
        return Err(BridgeError::InvalidSquare(square.to_owned()));
    }

    let file = bytes[0];
    let rank = bytes[1];
    if !(b'a'..=b'h').contains(&file) {
        return Err(BridgeError::InvalidSquare(format!(
            "{square} (file {})",
            file as char
        )));
    }
    if !(b'1'..=b'8').contains(&rank) {
        return Err(BridgeError::InvalidSquare(format!(
            "{square} (rank {})",
            rank as char
        )));
    }

    let engine_file = 7 - (file - b'a');
    let engine_rank = rank - b'1';
    Ok(engine_rank * 8 + engine_file)
}

/// Convert an engine index to the UI token that names its square element.
#[inline]
pub fn engine_index_to_ui_identifier(index: EngineSquare, prefix: &str) -> BridgeResult<String> {
    if index > 63 {
        return Err(BridgeError::InvalidSquare(index.to_string()));
    }

    let engine_file = index % 8;
    let engine_rank = index / 8;
    let chess_file = 8 - engine_file;
    let chess_rank = engine_rank + 1;
    Ok(format!("{prefix}{chess_file}{chess_rank}"))
}

/// Convert an engine index to algebraic text.
#[inline]
pub fn engine_index_to_algebraic(index: EngineSquare) -> BridgeResult<String> {
    if index > 63 {
        return Err(BridgeError::InvalidSquare(index.to_string()));
    }

    let file_char = char::from(b'a' + (7 - index % 8));
    let rank_char = char::from(b'1' + index / 8);
    Ok(format!("{file_char}{rank_char}"))
}

#[cfg(test)]
mod tests {
    use super::{
        algebraic_to_engine_index, engine_index_to_algebraic, engine_index_to_ui_identifier,
        ui_identifier_to_index, DEFAULT_UI_SQUARE_PREFIX,
    };

    #[test]
    fn corner_squares_map_to_flipped_files() {
        assert_eq!(algebraic_to_engine_index("a1").expect("a1 should parse"), 7);
        assert_eq!(algebraic_to_engine_index("h1").expect("h1 should parse"), 0);
        assert_eq!(algebraic_to_engine_index("a8").expect("a8 should parse"), 63);
        assert_eq!(algebraic_to_engine_index("h8").expect("h8 should parse"), 56);
    }

    #[test]
    fn ui_identifier_round_trips_every_index() {
        for index in 0..64u8 {
            let identifier = engine_index_to_ui_identifier(index, DEFAULT_UI_SQUARE_PREFIX)
                .expect("index in range should convert");
            assert_eq!(
                ui_identifier_to_index(&identifier).expect("identifier should parse back"),
                index
            );
        }
    }

    #[test]
    fn algebraic_round_trips_every_index() {
        for index in 0..64u8 {
            let text = engine_index_to_algebraic(index).expect("index in range should convert");
            assert_eq!(
                algebraic_to_engine_index(&text).expect("text should parse back"),
                index
            );
        }
    }

    #[test]
    fn ui_and_algebraic_agree_on_named_squares() {
        let e2 = algebraic_to_engine_index("e2").expect("e2 should parse");
        let e4 = algebraic_to_engine_index("e4").expect("e4 should parse");
        assert_eq!(e2, 11);
        assert_eq!(e4, 27);
        assert_eq!(
            engine_index_to_ui_identifier(e2, DEFAULT_UI_SQUARE_PREFIX).expect("e2 converts"),
            "square-52"
        );
        assert_eq!(
            ui_identifier_to_index("highlight square-54").expect("class string should parse"),
            e4
        );
    }

    #[test]
    fn out_of_domain_input_is_rejected() {
        assert!(algebraic_to_engine_index("i1").is_err());
        assert!(algebraic_to_engine_index("a9").is_err());
        assert!(algebraic_to_engine_index("e").is_err());
        assert!(ui_identifier_to_index("square-09").is_err());
        assert!(ui_identifier_to_index("7").is_err());
        assert!(engine_index_to_ui_identifier(64, DEFAULT_UI_SQUARE_PREFIX).is_err());
        assert!(engine_index_to_algebraic(200).is_err());
    }
}
