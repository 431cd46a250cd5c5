//! Escrow balance invariant: funds held match the stakes still owed.

use super::super::game::Game;
use super::Invariant;

/// Invariant: `escrowed == stake × depositors not yet paid`, and an outcome
/// is recorded exactly when the game is finished.
///
/// Waiting games hold one stake, games in progress hold two, finished games
/// hold nothing.
pub struct EscrowBalanceInvariant;

impl Invariant<Game> for EscrowBalanceInvariant {
    fn holds(game: &Game) -> bool {
        let expected = game.stake().checked_mul(game.depositors());
        expected == Some(*game.escrowed()) && game.outcome().is_some() == game.is_finished()
    }

    fn description() -> &'static str {
        "Escrow equals the stakes not yet paid out"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::Player;
    use crate::registry::account::AccountId;
    use crate::registry::game::Outcome;

    #[test]
    fn test_escrow_follows_lifecycle() {
        let mut game = Game::open(1, AccountId::new("alice"), 3, 0);
        assert!(EscrowBalanceInvariant::holds(&game));

        game.seat_joiner(AccountId::new("bob"), 3, 1);
        assert_eq!(*game.escrowed(), 6);
        assert!(EscrowBalanceInvariant::holds(&game));

        assert_eq!(game.finish(Outcome::Winner(Player::One)), 6);
        assert!(EscrowBalanceInvariant::holds(&game));
    }

    #[test]
    fn test_stranded_funds_violate() {
        let mut game = Game::open(1, AccountId::new("alice"), 1, 0);
        game.finish(Outcome::Cancelled);
        game.set_escrowed(1);
        assert!(!EscrowBalanceInvariant::holds(&game));
    }
}
