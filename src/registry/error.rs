//! Errors surfaced by registry calls.
//!
//! Every variant is a rejected call: the registry is left exactly as it was
//! before the call and any attached value goes back to the caller.

use super::account::{Amount, GameId, Timestamp};
use super::treasury::TransferError;
use crate::games::tictactoe::Position;

/// Rejection reason for a registry call.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RegistryError {
    /// Attached value differs from the required stake.
    #[display("Deposit of {actual} does not match the required stake of {expected}")]
    InvalidStake {
        /// Required stake.
        expected: Amount,
        /// Value attached to the call.
        actual: Amount,
    },

    /// No game was ever created under this identifier.
    #[display("Game {game_id} does not exist")]
    NotFound {
        /// Requested identifier.
        game_id: GameId,
    },

    /// Game is missing or no longer waiting for an opponent.
    #[display("Game {game_id} cannot be joined")]
    GameNotJoinable {
        /// Requested identifier.
        game_id: GameId,
    },

    /// Game is missing or not in progress.
    #[display("Game {game_id} is not in progress")]
    GameNotActive {
        /// Requested identifier.
        game_id: GameId,
    },

    /// Caller is not the creator, or an opponent already joined.
    #[display("Game {game_id} cannot be cancelled by this caller")]
    CancelNotAllowed {
        /// Requested identifier.
        game_id: GameId,
    },

    /// Creator tried to join their own game.
    #[display("Cannot join own game {game_id}")]
    CannotJoinOwnGame {
        /// Requested identifier.
        game_id: GameId,
    },

    /// Caller is not the player to move.
    #[display("Not the caller's turn in game {game_id}")]
    NotYourTurn {
        /// Requested identifier.
        game_id: GameId,
    },

    /// Cell outside 0..=8.
    #[display("Cell {cell} is off the board")]
    InvalidMove {
        /// Requested cell.
        cell: usize,
    },

    /// Cell already holds a mark.
    #[display("Square {position} is already occupied")]
    CellOccupied {
        /// Requested cell.
        position: Position,
    },

    /// The player to move has not yet exceeded the inactivity threshold.
    #[display("Game {game_id} cannot be punished before {eligible_after}")]
    TooEarlyToPunish {
        /// Requested identifier.
        game_id: GameId,
        /// Punishment is allowed strictly after this time.
        eligible_after: Timestamp,
    },

    /// Only the player waiting on the opponent may punish.
    #[display("Only the waiting player may punish in game {game_id}")]
    NotWaitingPlayer {
        /// Requested identifier.
        game_id: GameId,
    },

    /// Caller never joined the game.
    #[display("Caller is not a participant of game {game_id}")]
    NotAParticipant {
        /// Requested identifier.
        game_id: GameId,
    },

    /// A postcondition failed; the call was reverted.
    #[display("Invariant violation: {description}")]
    InvariantViolation {
        /// Which invariants failed.
        description: String,
    },

    /// The treasury refused the payout; the call was reverted.
    #[display("Payout failed: {source}")]
    TransferFailed {
        /// Underlying transfer failure.
        source: TransferError,
    },
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::TransferFailed { source } => Some(source),
            _ => None,
        }
    }
}

impl From<TransferError> for RegistryError {
    fn from(source: TransferError) -> Self {
        RegistryError::TransferFailed { source }
    }
}
