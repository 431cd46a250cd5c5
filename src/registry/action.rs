//! First-class call types for the registry.
//!
//! Each state-changing call is a value that can be validated against a
//! [`Game`](super::Game) before anything is mutated. The registry builds
//! these from its arguments and hands them to the matching contract.

use super::account::{AccountId, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Second player joining with their stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct Join {
    /// Joining account.
    pub caller: AccountId,
    /// Value attached to the call.
    pub deposit: Amount,
}

/// Creator withdrawing an unjoined game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct Cancel {
    /// Calling account.
    pub caller: AccountId,
}

/// A player placing their mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct MakeMove {
    /// Moving account.
    pub caller: AccountId,
    /// Requested cell, 0..=8. Range is checked by the contract.
    pub cell: usize,
}

/// Waiting player claiming the pot from an inactive opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct Punish {
    /// Claiming account.
    pub caller: AccountId,
    /// Time of the call.
    pub now: Timestamp,
    /// Inactivity threshold in seconds.
    pub timeout: u64,
}

impl std::fmt::Display for MakeMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> cell {}", self.caller, self.cell)
    }
}
