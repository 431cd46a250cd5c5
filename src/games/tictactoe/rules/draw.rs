//! Draw detection logic for tic-tac-toe.

use super::super::{Board, Square};
use super::win::check_winner;
use tracing::instrument;

/// Checks if the board is full (all squares occupied).
#[instrument(skip(board))]
pub fn is_full(board: &Board) -> bool {
    board.squares().iter().all(|s| *s != Square::Empty)
}

/// A full board with no winner.
#[instrument(skip(board))]
pub fn is_draw(board: &Board) -> bool {
    is_full(board) && check_winner(board).is_none()
}

#[cfg(test)]
mod tests {
    use super::super::super::{Player, Position};
    use super::*;

    fn fill(cells: [(Position, Player); 9]) -> Board {
        let mut board = Board::new();
        for (pos, player) in cells {
            board.set(pos, Square::Occupied(player));
        }
        board
    }

    #[test]
    fn test_empty_board_not_full() {
        let board = Board::new();
        assert!(!is_full(&board));
        assert!(!is_draw(&board));
    }

    #[test]
    fn test_partial_board_not_full() {
        let mut board = Board::new();
        board.set(Position::Center, Square::Occupied(Player::One));
        assert!(!is_full(&board));
    }

    #[test]
    fn test_draw_detection() {
        // X O X / O X X / O X O
        let board = fill([
            (Position::TopLeft, Player::One),
            (Position::TopCenter, Player::Two),
            (Position::TopRight, Player::One),
            (Position::MiddleLeft, Player::Two),
            (Position::Center, Player::One),
            (Position::MiddleRight, Player::One),
            (Position::BottomLeft, Player::Two),
            (Position::BottomCenter, Player::One),
            (Position::BottomRight, Player::Two),
        ]);
        assert!(is_full(&board));
        assert!(is_draw(&board));
    }

    #[test]
    fn test_full_board_with_line_is_not_draw() {
        // X X X / O O X / X O O
        let board = fill([
            (Position::TopLeft, Player::One),
            (Position::TopCenter, Player::One),
            (Position::TopRight, Player::One),
            (Position::MiddleLeft, Player::Two),
            (Position::Center, Player::Two),
            (Position::MiddleRight, Player::One),
            (Position::BottomLeft, Player::One),
            (Position::BottomCenter, Player::Two),
            (Position::BottomRight, Player::Two),
        ]);
        assert!(is_full(&board));
        assert!(!is_draw(&board));
    }
}
