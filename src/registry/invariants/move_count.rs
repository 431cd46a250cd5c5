//! Move count invariant: the counter, the history and the board agree.

use super::super::game::Game;
use super::Invariant;

/// Invariant: `move_count` equals the history length and the number of
/// occupied squares, and never exceeds 9.
pub struct MoveCountInvariant;

impl Invariant<Game> for MoveCountInvariant {
    fn holds(game: &Game) -> bool {
        let count = usize::from(*game.move_count());
        count <= 9 && count == game.history().len() && count == game.board().occupied()
    }

    fn description() -> &'static str {
        "Move count matches history and occupied squares"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::{Player, Position, Square};
    use crate::registry::account::AccountId;

    fn started() -> Game {
        let mut game = Game::open(1, AccountId::new("alice"), 1, 0);
        game.seat_joiner(AccountId::new("bob"), 1, 1);
        game
    }

    #[test]
    fn test_count_tracks_moves() {
        let mut game = started();
        game.place(Player::One, Position::Center, 2);
        game.place(Player::Two, Position::TopLeft, 3);
        assert!(MoveCountInvariant::holds(&game));
        assert_eq!(*game.move_count(), 2);
    }

    #[test]
    fn test_untracked_mark_violates() {
        let mut game = started();
        game.board_mut()
            .set(Position::Center, Square::Occupied(Player::One));
        assert!(!MoveCountInvariant::holds(&game));
    }
}
