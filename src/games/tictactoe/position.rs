//! Cell addressing for the 3x3 board.

use super::types::Board;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A cell on the tic-tac-toe board (0-8, row-major).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter,
)]
pub enum Position {
    /// Top-left (cell 0)
    TopLeft,
    /// Top-center (cell 1)
    TopCenter,
    /// Top-right (cell 2)
    TopRight,
    /// Middle-left (cell 3)
    MiddleLeft,
    /// Center (cell 4)
    Center,
    /// Middle-right (cell 5)
    MiddleRight,
    /// Bottom-left (cell 6)
    BottomLeft,
    /// Bottom-center (cell 7)
    BottomCenter,
    /// Bottom-right (cell 8)
    BottomRight,
}

impl Position {
    /// All 9 positions, in cell order.
    pub const ALL: [Position; 9] = [
        Position::TopLeft,
        Position::TopCenter,
        Position::TopRight,
        Position::MiddleLeft,
        Position::Center,
        Position::MiddleRight,
        Position::BottomLeft,
        Position::BottomCenter,
        Position::BottomRight,
    ];

    /// Get label for this position (for display).
    pub fn label(&self) -> &'static str {
        match self {
            Position::TopLeft => "Top-left",
            Position::TopCenter => "Top-center",
            Position::TopRight => "Top-right",
            Position::MiddleLeft => "Middle-left",
            Position::Center => "Center",
            Position::MiddleRight => "Middle-right",
            Position::BottomLeft => "Bottom-left",
            Position::BottomCenter => "Bottom-center",
            Position::BottomRight => "Bottom-right",
        }
    }

    /// Converts position to board cell (0-8).
    pub fn to_index(self) -> usize {
        match self {
            Position::TopLeft => 0,
            Position::TopCenter => 1,
            Position::TopRight => 2,
            Position::MiddleLeft => 3,
            Position::Center => 4,
            Position::MiddleRight => 5,
            Position::BottomLeft => 6,
            Position::BottomCenter => 7,
            Position::BottomRight => 8,
        }
    }

    /// Creates position from board cell. Out-of-range cells yield `None`.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parse from label or cell number (0-8).
    #[instrument]
    pub fn from_label_or_number(s: &str) -> Option<Position> {
        if let Ok(num) = s.trim().parse::<usize>() {
            return Self::from_index(num);
        }

        let s_lower = s.trim().to_lowercase();
        <Position as strum::IntoEnumIterator>::iter()
            .find(|pos| pos.label().to_lowercase() == s_lower)
    }

    /// Returns only the empty cells of the board.
    #[instrument(skip(board))]
    pub fn valid_moves(board: &Board) -> Vec<Position> {
        Self::ALL
            .iter()
            .copied()
            .filter(|pos| board.is_empty(*pos))
            .collect()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label(), self.to_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::{Player, Square};

    #[test]
    fn test_index_matches_table_order() {
        for (i, pos) in Position::ALL.iter().enumerate() {
            assert_eq!(pos.to_index(), i);
            assert_eq!(Position::from_index(i), Some(*pos));
        }
        assert_eq!(Position::from_index(9), None);
    }

    #[test]
    fn test_parse_label_and_number() {
        assert_eq!(Position::from_label_or_number("4"), Some(Position::Center));
        assert_eq!(
            Position::from_label_or_number("bottom-left"),
            Some(Position::BottomLeft)
        );
        assert_eq!(Position::from_label_or_number("12"), None);
        assert_eq!(Position::from_label_or_number("nowhere"), None);
    }

    #[test]
    fn test_valid_moves_skip_occupied() {
        let mut board = Board::new();
        board.set(Position::Center, Square::Occupied(Player::One));
        let moves = Position::valid_moves(&board);
        assert_eq!(moves.len(), 8);
        assert!(!moves.contains(&Position::Center));
    }
}
