//! Strictly Wager library - stake-backed tic-tac-toe
//!
//! Two players escrow an equal stake, play tic-tac-toe, and the registry
//! pays out when the game ends: the whole pot to a winner, one stake back
//! to each player on a tie, the creator's stake back on cancellation, and
//! the pot to the waiting player when the player to move stays idle past
//! the configured timeout.
//!
//! # Architecture
//!
//! - **Games**: pure tic-tac-toe rules (board, positions, win/draw)
//! - **Registry**: escrowed game records, call contracts, invariants,
//!   treasury and event log
//! - **Session**: sandbox execution environment with wallets and a block clock
//! - **Config**: stake and punish timeout, loaded from TOML
//!
//! # Example
//!
//! ```
//! use strictly_wager::{AccountId, Call, CallOutcome, Session, WagerConfig};
//!
//! # fn example() -> Result<(), strictly_wager::SessionError> {
//! let alice = AccountId::new("alice");
//! let mut session = Session::new(WagerConfig::default());
//! session.fund(&alice, 10)?;
//!
//! let outcome = session.submit(&Call::Create { caller: alice.clone(), value: 1 })?;
//! assert_eq!(outcome, CallOutcome::Created { game_id: 1 });
//! assert_eq!(session.balance_of(&alice), 9);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod games;
pub mod registry;
pub mod session;

// Crate-level exports - Configuration
pub use config::{ConfigError, WagerConfig, DEFAULT_PUNISH_TIMEOUT_SECS, DEFAULT_STAKE};

// Crate-level exports - Registry
pub use registry::{
    AccountId, Amount, Game, GameId, GameRegistry, GameState, InMemoryTreasury, Outcome, Payout,
    RegistryError, RegistryEvent, Timestamp, TransferError, Treasury,
};

// Crate-level exports - Sandbox session
pub use session::{Call, CallOutcome, Cell, CallReport, Funding, Script, ScriptError, Session, SessionError};

// Crate-level exports - Game types (tic-tac-toe)
pub use games::tictactoe::{Board, Player, Position, Square};
