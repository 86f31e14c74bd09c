//! Fixed LED pairs used as status signals

use rookwire_protocol::Square;

use crate::game::{Color, Outcome};

/// A pair of squares lit together
pub type Pattern = (Square, Square);

/// Playing white / white won
pub const WHITE: Pattern = (Square::at(2, 1), Square::at(5, 0)); // c2, f1
/// Playing black / black won
pub const BLACK: Pattern = (Square::at(5, 6), Square::at(2, 7)); // f7, c8
/// Game ended without a winner
pub const NO_WINNER: Pattern = (Square::at(4, 0), Square::at(3, 7)); // e1, d8
/// Seek posted, waiting for an opponent
pub const SEEKING: Pattern = (Square::at(3, 0), Square::at(4, 7)); // d1, e8

pub fn color_announcement(color: Color) -> Pattern {
    match color {
        Color::White => WHITE,
        Color::Black => BLACK,
    }
}

pub fn outcome_pattern(outcome: &Outcome) -> Pattern {
    match outcome.winner {
        Some(color) => color_announcement(color),
        None => NO_WINNER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameStatus;

    fn pair(a: &str, b: &str) -> Pattern {
        (Square::parse(a).unwrap(), Square::parse(b).unwrap())
    }

    #[test]
    fn test_patterns() {
        assert_eq!(WHITE, pair("c2", "f1"));
        assert_eq!(BLACK, pair("f7", "c8"));
        assert_eq!(NO_WINNER, pair("e1", "d8"));
        assert_eq!(SEEKING, pair("d1", "e8"));
    }

    #[test]
    fn test_outcome_pattern() {
        let black = Outcome {
            status: GameStatus::Mate,
            winner: Some(Color::Black),
        };
        assert_eq!(outcome_pattern(&black), BLACK);
        let drawn = Outcome {
            status: GameStatus::Draw,
            winner: None,
        };
        assert_eq!(outcome_pattern(&drawn), NO_WINNER);
    }
}
