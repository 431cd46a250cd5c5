//! Core domain types for tic-tac-toe.

use super::position::Position;
use serde::{Deserialize, Serialize};

/// Seat at the table. Player one is always the creator and moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    /// Creator of the game (externally numbered 1).
    One,
    /// Joiner of the game (externally numbered 2).
    Two,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// External numbering: 1 for the creator, 2 for the joiner.
    pub fn index(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    /// Board symbol used when rendering.
    pub fn symbol(self) -> char {
        match self {
            Player::One => 'X',
            Player::Two => 'O',
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {}", self.index())
    }
}

/// A square on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Square {
    /// Empty square.
    Empty,
    /// Square occupied by a player.
    Occupied(Player),
}

/// 3x3 tic-tac-toe board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; 9],
        }
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Sets the square at the given position.
    pub fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.to_index()] = square;
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares as a slice.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Number of squares holding the given player's mark.
    pub fn count(&self, player: Player) -> usize {
        self.squares
            .iter()
            .filter(|s| **s == Square::Occupied(player))
            .count()
    }

    /// Number of occupied squares.
    pub fn occupied(&self) -> usize {
        self.squares.iter().filter(|s| **s != Square::Empty).count()
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.squares[pos] {
                    Square::Empty => pos.to_string(),
                    Square::Occupied(player) => player.symbol().to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_swaps() {
        assert_eq!(Player::One.opponent(), Player::Two);
        assert_eq!(Player::Two.opponent(), Player::One);
    }

    #[test]
    fn test_counts_track_marks() {
        let mut board = Board::new();
        board.set(Position::Center, Square::Occupied(Player::One));
        board.set(Position::TopLeft, Square::Occupied(Player::Two));
        board.set(Position::BottomRight, Square::Occupied(Player::One));
        assert_eq!(board.count(Player::One), 2);
        assert_eq!(board.count(Player::Two), 1);
        assert_eq!(board.occupied(), 3);
    }

    #[test]
    fn test_display_uses_indices_for_empty() {
        let mut board = Board::new();
        board.set(Position::Center, Square::Occupied(Player::One));
        assert_eq!(board.display(), "0|1|2\n-+-+-\n3|X|5\n-+-+-\n6|7|8");
    }
}
