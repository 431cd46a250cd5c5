//! Monotonic board invariant: squares never change once set.

use super::super::game::Game;
use super::Invariant;
use crate::games::tictactoe::{Board, Player, Square};

/// Invariant: Board squares are monotonic (never overwritten).
///
/// Replaying the move history onto an empty board, with player one moving
/// first, only ever fills empty squares and reproduces the stored board.
pub struct MonotonicBoardInvariant;

impl Invariant<Game> for MonotonicBoardInvariant {
    fn holds(game: &Game) -> bool {
        let mut reconstructed = Board::new();
        let mut mover = Player::One;

        for pos in game.history() {
            if reconstructed.get(*pos) != Square::Empty {
                return false;
            }
            reconstructed.set(*pos, Square::Occupied(mover));
            mover = mover.opponent();
        }

        reconstructed == *game.board()
    }

    fn description() -> &'static str {
        "Board squares are monotonic (never overwritten)"
    }
}
