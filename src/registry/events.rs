//! Event log emitted by committed registry calls.

use super::account::{AccountId, Amount, GameId};
use crate::games::tictactoe::{Player, Position};
use serde::{Deserialize, Serialize};

/// Something observable that happened to a game.
///
/// Events are appended only when the call that produced them commits; a
/// rejected or reverted call leaves no trace in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A new game is waiting for an opponent.
    GameCreated {
        /// Assigned identifier.
        game_id: GameId,
        /// Player one.
        creator: AccountId,
        /// Stake escrowed by the creator.
        stake: Amount,
    },
    /// A second player joined and play began.
    GameJoined {
        /// Game identifier.
        game_id: GameId,
        /// Player two.
        joiner: AccountId,
    },
    /// The creator withdrew an unjoined game.
    GameCancelled {
        /// Game identifier.
        game_id: GameId,
        /// Amount refunded to the creator.
        refund: Amount,
    },
    /// A mark was placed.
    MoveMade {
        /// Game identifier.
        game_id: GameId,
        /// Who moved.
        player: Player,
        /// Where.
        position: Position,
    },
    /// A move completed a line.
    GameWon {
        /// Game identifier.
        game_id: GameId,
        /// Winning account.
        winner: AccountId,
        /// Pot paid to the winner.
        payout: Amount,
    },
    /// The board filled without a line.
    GameTied {
        /// Game identifier.
        game_id: GameId,
        /// Amount refunded to each player.
        refund: Amount,
    },
    /// The player to move timed out and forfeited.
    PlayerPunished {
        /// Game identifier.
        game_id: GameId,
        /// Account that failed to move.
        punished: AccountId,
        /// Account awarded the pot.
        winner: AccountId,
        /// Pot paid to the winner.
        payout: Amount,
    },
}

impl RegistryEvent {
    /// Game the event belongs to.
    pub fn game_id(&self) -> GameId {
        match self {
            RegistryEvent::GameCreated { game_id, .. }
            | RegistryEvent::GameJoined { game_id, .. }
            | RegistryEvent::GameCancelled { game_id, .. }
            | RegistryEvent::MoveMade { game_id, .. }
            | RegistryEvent::GameWon { game_id, .. }
            | RegistryEvent::GameTied { game_id, .. }
            | RegistryEvent::PlayerPunished { game_id, .. } => *game_id,
        }
    }
}
