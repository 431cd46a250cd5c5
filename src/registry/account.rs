//! Identities and units shared by every registry call.

use serde::{Deserialize, Serialize};

/// Sequential game identifier. The first game is 1.
pub type GameId = u64;

/// Indivisible balance unit.
pub type Amount = u64;

/// Seconds, as reported by the execution environment's clock.
pub type Timestamp = u64;

/// Address of a caller or payout recipient.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Creates an account identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
