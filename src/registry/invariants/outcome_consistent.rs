//! Outcome invariant: the recorded settlement agrees with the board.

use super::super::game::{Game, Outcome};
use super::Invariant;
use crate::games::tictactoe::rules::{check_winner, is_draw};

/// Invariant: a win is recorded only for the player holding a line, a draw
/// only on a full board without a line, and every other record has no line
/// on the board.
pub struct OutcomeConsistentInvariant;

impl Invariant<Game> for OutcomeConsistentInvariant {
    fn holds(game: &Game) -> bool {
        let board = game.board();
        match game.outcome() {
            Some(Outcome::Winner(player)) => check_winner(board) == Some(*player),
            Some(Outcome::Draw) => is_draw(board),
            Some(Outcome::Forfeit { .. }) | Some(Outcome::Cancelled) | None => {
                check_winner(board).is_none()
            }
        }
    }

    fn description() -> &'static str {
        "Recorded outcome matches the board"
    }
}
