//! First-class invariants for escrowed games.
//!
//! Invariants are logical properties that must hold for every committed
//! game record. They are testable independently and serve as documentation
//! of what the registry guarantees.

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples of [`Invariant`]s.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set.
    ///
    /// Returns Ok(()) if all invariants hold, or Err with a list of
    /// violations if any invariant fails.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! impl_invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>,)+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();

                $(
                    if !$inv::holds(state) {
                        violations.push(InvariantViolation::new($inv::description()));
                    }
                )+

                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

impl_invariant_set!(I1, I2);
impl_invariant_set!(I1, I2, I3);
impl_invariant_set!(I1, I2, I3, I4);
impl_invariant_set!(I1, I2, I3, I4, I5);

pub mod alternating_turn;
pub mod escrow_balance;
pub mod monotonic_board;
pub mod move_count;
pub mod outcome_consistent;

pub use alternating_turn::AlternatingTurnInvariant;
pub use escrow_balance::EscrowBalanceInvariant;
pub use monotonic_board::MonotonicBoardInvariant;
pub use move_count::MoveCountInvariant;
pub use outcome_consistent::OutcomeConsistentInvariant;

/// All game-record invariants as a composable set.
pub type GameInvariants = (
    MonotonicBoardInvariant,
    AlternatingTurnInvariant,
    MoveCountInvariant,
    EscrowBalanceInvariant,
    OutcomeConsistentInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::{Player, Position, Square};
    use crate::registry::account::AccountId;
    use crate::registry::game::Game;

    fn started() -> Game {
        let mut game = Game::open(1, AccountId::new("alice"), 1, 0);
        game.seat_joiner(AccountId::new("bob"), 1, 1);
        game
    }

    #[test]
    fn test_invariant_set_holds_for_new_game() {
        let game = Game::open(1, AccountId::new("alice"), 1, 0);
        assert!(GameInvariants::check_all(&game).is_ok());
    }

    #[test]
    fn test_invariant_set_holds_after_moves() {
        let mut game = started();
        for (player, pos) in [
            (Player::One, Position::TopLeft),
            (Player::Two, Position::Center),
            (Player::One, Position::TopRight),
        ] {
            game.place(player, pos, 2);
            game.pass_turn();
        }
        assert!(GameInvariants::check_all(&game).is_ok());
    }

    #[test]
    fn test_invariant_set_detects_violations() {
        let mut game = started();
        game.place(Player::One, Position::Center, 2);
        game.pass_turn();
        game.board_mut()
            .set(Position::TopLeft, Square::Occupied(Player::Two));

        let violations = GameInvariants::check_all(&game).unwrap_err();
        assert!(!violations.is_empty());
    }

    #[test]
    fn test_invariant_set_detects_unearned_win() {
        let mut game = started();
        game.place(Player::One, Position::Center, 2);
        game.finish(crate::registry::game::Outcome::Winner(Player::One));

        let violations = GameInvariants::check_all(&game).unwrap_err();
        assert!(violations
            .iter()
            .any(|v| v.description == OutcomeConsistentInvariant::description()));
    }

    #[test]
    fn test_two_invariants_as_set() {
        let game = started();
        type TwoInvariants = (MonotonicBoardInvariant, EscrowBalanceInvariant);
        assert!(TwoInvariants::check_all(&game).is_ok());
    }
}
