//! Outbound value transfer.
//!
//! The registry never moves funds itself. Once a terminal transition is
//! fully recorded it hands a batch of [`Payout`]s to its [`Treasury`], which
//! must pay all of them or none.

use super::account::{AccountId, Amount};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

/// A single transfer out of escrow.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, derive_new::new)]
pub struct Payout {
    /// Who receives the funds.
    recipient: AccountId,
    /// How much is paid.
    amount: Amount,
}

/// Why a transfer could not complete.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum TransferError {
    /// The recipient cannot accept funds.
    #[display("Account {_0} is unreachable")]
    Unreachable(AccountId),

    /// The payer holds less than requested.
    #[display("Account {account} holds {balance}, {requested} requested")]
    InsufficientFunds {
        /// Paying account.
        account: AccountId,
        /// Its current balance.
        balance: Amount,
        /// Requested amount.
        requested: Amount,
    },

    /// Crediting would overflow the recipient's balance.
    #[display("Balance of {_0} would overflow")]
    Overflow(AccountId),
}

impl std::error::Error for TransferError {}

/// Value-transfer primitive consumed by the registry.
pub trait Treasury {
    /// Pays every payout, or none of them.
    ///
    /// # Errors
    ///
    /// Returns the first reason the batch cannot complete. No recipient may
    /// have been credited when an error is returned.
    fn disburse(&mut self, payouts: &[Payout]) -> Result<(), TransferError>;
}

/// Wallet ledger holding every account's balance plus the funds the
/// registry currently holds in escrow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryTreasury {
    balances: BTreeMap<AccountId, Amount>,
    held: Amount,
    unreachable: BTreeSet<AccountId>,
}

impl InMemoryTreasury {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of an account; unknown accounts hold nothing.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Funds currently held on behalf of the registry.
    pub fn held(&self) -> Amount {
        self.held
    }

    /// All known balances.
    pub fn balances(&self) -> &BTreeMap<AccountId, Amount> {
        &self.balances
    }

    /// Mints funds into an account.
    #[instrument(skip(self))]
    pub fn fund(&mut self, account: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let balance = self.balance_of(account);
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(account.clone()))?;
        self.balances.insert(account.clone(), updated);
        Ok(())
    }

    /// Marks an account as unable (or able again) to receive payouts.
    #[instrument(skip(self))]
    pub fn set_unreachable(&mut self, account: &AccountId, unreachable: bool) {
        if unreachable {
            self.unreachable.insert(account.clone());
        } else {
            self.unreachable.remove(account);
        }
    }

    /// Moves value attached to a call from the caller into the held pool.
    #[instrument(skip(self))]
    pub fn collect(&mut self, from: &AccountId, amount: Amount) -> Result<(), TransferError> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self.balance_of(from);
        if balance < amount {
            warn!(account = %from, balance, amount, "Insufficient funds for attached value");
            return Err(TransferError::InsufficientFunds {
                account: from.clone(),
                balance,
                requested: amount,
            });
        }
        let held = self
            .held
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(from.clone()))?;
        self.balances.insert(from.clone(), balance - amount);
        self.held = held;
        Ok(())
    }

    /// Returns value collected for a call that was then rejected.
    ///
    /// Only ever undoes a matching [`collect`](Self::collect), so the funds
    /// are known to be held and the caller's balance cannot overflow.
    #[instrument(skip(self))]
    pub fn return_collected(&mut self, to: &AccountId, amount: Amount) {
        if amount == 0 {
            return;
        }
        let balance = self.balance_of(to);
        self.held = self.held.saturating_sub(amount);
        self.balances.insert(to.clone(), balance.saturating_add(amount));
    }
}

impl Treasury for InMemoryTreasury {
    #[instrument(skip(self), fields(count = payouts.len()))]
    fn disburse(&mut self, payouts: &[Payout]) -> Result<(), TransferError> {
        // Validate the whole batch before crediting anyone.
        let mut credited = self.balances.clone();
        let mut remaining = self.held;
        for payout in payouts {
            if self.unreachable.contains(&payout.recipient) {
                warn!(recipient = %payout.recipient, "Payout recipient unreachable");
                return Err(TransferError::Unreachable(payout.recipient.clone()));
            }
            remaining = remaining.checked_sub(payout.amount).ok_or_else(|| {
                TransferError::InsufficientFunds {
                    account: AccountId::new("treasury"),
                    balance: remaining,
                    requested: payout.amount,
                }
            })?;
            let entry = credited.entry(payout.recipient.clone()).or_insert(0);
            *entry = entry
                .checked_add(payout.amount)
                .ok_or_else(|| TransferError::Overflow(payout.recipient.clone()))?;
        }

        self.balances = credited;
        self.held = remaining;
        debug!(held = self.held, "Payouts disbursed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    fn bob() -> AccountId {
        AccountId::new("bob")
    }

    #[test]
    fn test_collect_moves_funds_into_held_pool() {
        let mut treasury = InMemoryTreasury::new();
        treasury.fund(&alice(), 5).unwrap();
        treasury.collect(&alice(), 2).unwrap();
        assert_eq!(treasury.balance_of(&alice()), 3);
        assert_eq!(treasury.held(), 2);
    }

    #[test]
    fn test_collect_rejects_overdraft() {
        let mut treasury = InMemoryTreasury::new();
        treasury.fund(&alice(), 1).unwrap();
        let result = treasury.collect(&alice(), 2);
        assert!(matches!(result, Err(TransferError::InsufficientFunds { .. })));
        assert_eq!(treasury.balance_of(&alice()), 1);
        assert_eq!(treasury.held(), 0);
    }

    #[test]
    fn test_return_collected_restores_balance() {
        let mut treasury = InMemoryTreasury::new();
        treasury.fund(&alice(), 1).unwrap();
        treasury.collect(&alice(), 1).unwrap();
        treasury.return_collected(&alice(), 1);
        assert_eq!(treasury.balance_of(&alice()), 1);
        assert_eq!(treasury.held(), 0);
    }

    #[test]
    fn test_disburse_is_all_or_nothing() {
        let mut treasury = InMemoryTreasury::new();
        treasury.fund(&alice(), 1).unwrap();
        treasury.fund(&bob(), 1).unwrap();
        treasury.collect(&alice(), 1).unwrap();
        treasury.collect(&bob(), 1).unwrap();
        treasury.set_unreachable(&bob(), true);

        let payouts = [Payout::new(alice(), 1), Payout::new(bob(), 1)];
        let result = treasury.disburse(&payouts);
        assert_eq!(result, Err(TransferError::Unreachable(bob())));
        assert_eq!(treasury.balance_of(&alice()), 0);
        assert_eq!(treasury.held(), 2);

        treasury.set_unreachable(&bob(), false);
        treasury.disburse(&payouts).unwrap();
        assert_eq!(treasury.balance_of(&alice()), 1);
        assert_eq!(treasury.balance_of(&bob()), 1);
        assert_eq!(treasury.held(), 0);
    }

    #[test]
    fn test_disburse_cannot_exceed_held_funds() {
        let mut treasury = InMemoryTreasury::new();
        let result = treasury.disburse(&[Payout::new(alice(), 1)]);
        assert!(matches!(result, Err(TransferError::InsufficientFunds { .. })));
        assert_eq!(treasury.balance_of(&alice()), 0);
    }
}
