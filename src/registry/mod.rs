//! Stake-backed game registry.
//!
//! Players escrow a fixed stake to open or join a game, take turns on the
//! shared board, and the registry pays the pot out when the game ends by a
//! win, a tie, a cancellation or a timeout forfeit.

mod account;
mod action;
pub mod contracts;
mod error;
mod events;
mod game;
mod game_registry;
pub mod invariants;
mod treasury;

pub use account::{AccountId, Amount, GameId, Timestamp};
pub use action::{Cancel, Join, MakeMove, Punish};
pub use contracts::{
    CancelContract, Contract, JoinContract, MoveContract, PunishContract, transition_holds,
};
pub use error::RegistryError;
pub use events::RegistryEvent;
pub use game::{Game, GameState, Outcome};
pub use game_registry::GameRegistry;
pub use invariants::{GameInvariants, Invariant, InvariantSet, InvariantViolation};
pub use treasury::{InMemoryTreasury, Payout, TransferError, Treasury};
