//! Alternating turn invariant: player one, player two, player one, ...

use super::super::game::{Game, GameState, Outcome};
use super::Invariant;
use crate::games::tictactoe::Player;

/// Invariant: Players alternate turns.
///
/// Player one never trails player two and never leads by more than one
/// mark. While in progress the player to move follows from the move
/// parity; nobody is to move before the join or after a draw.
pub struct AlternatingTurnInvariant;

impl AlternatingTurnInvariant {
    fn expected_mover(moves: usize) -> Player {
        if moves % 2 == 0 {
            Player::One
        } else {
            Player::Two
        }
    }
}

impl Invariant<Game> for AlternatingTurnInvariant {
    fn holds(game: &Game) -> bool {
        let ones = game.board().count(Player::One);
        let twos = game.board().count(Player::Two);
        if ones < twos || ones - twos > 1 {
            return false;
        }

        let moves = game.history().len();
        match (game.state(), game.outcome()) {
            (GameState::WaitingForOpponent, _) => game.current_player().is_none(),
            (GameState::InProgress, _) => {
                *game.current_player() == Some(Self::expected_mover(moves))
            }
            (GameState::Finished, Some(Outcome::Draw)) => game.current_player().is_none(),
            (GameState::Finished, Some(Outcome::Cancelled)) => game.current_player().is_none(),
            // A winning move leaves the winner as the last mover.
            (GameState::Finished, Some(Outcome::Winner(winner))) => {
                moves > 0
                    && Self::expected_mover(moves - 1) == *winner
                    && *game.current_player() == Some(*winner)
            }
            // A forfeit leaves the idle player to move.
            (GameState::Finished, Some(Outcome::Forfeit { winner })) => {
                *game.current_player() == Some(winner.opponent())
                    && Self::expected_mover(moves) == winner.opponent()
            }
            (GameState::Finished, None) => false,
        }
    }

    fn description() -> &'static str {
        "Players alternate turns (one, two, one, ...)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::Position;
    use crate::registry::account::AccountId;

    fn started() -> Game {
        let mut game = Game::open(1, AccountId::new("alice"), 1, 0);
        game.seat_joiner(AccountId::new("bob"), 1, 1);
        game
    }

    #[test]
    fn test_waiting_game_has_no_mover() {
        let game = Game::open(1, AccountId::new("alice"), 1, 0);
        assert!(AlternatingTurnInvariant::holds(&game));
    }

    #[test]
    fn test_single_move_holds() {
        let mut game = started();
        game.place(Player::One, Position::Center, 2);
        game.pass_turn();
        assert!(AlternatingTurnInvariant::holds(&game));
        assert_eq!(*game.current_player(), Some(Player::Two));
    }

    #[test]
    fn test_missing_turn_flip_violates() {
        let mut game = started();
        game.place(Player::One, Position::Center, 2);
        assert!(!AlternatingTurnInvariant::holds(&game));
    }

    #[test]
    fn test_forfeit_keeps_idle_player_to_move() {
        let mut game = started();
        game.finish(Outcome::Forfeit {
            winner: Player::Two,
        });
        assert!(AlternatingTurnInvariant::holds(&game));
    }
}
