//! Wallet balance types
//!
//! Invariant: `total == available + locked`, all fields non-negative.
//! Balances are mutated exclusively through the ledger service; these
//! mutators enforce the invariant at the type level.

use crate::ids::UserId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-user, per-asset custodial balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub user_id: UserId,
    pub asset: String,
    pub available: Decimal,
    pub locked: Decimal,
    pub total: Decimal,
}

impl WalletBalance {
    /// Create a new balance with everything available
    pub fn new(user_id: UserId, asset: impl Into<String>, total: Decimal) -> Self {
        assert!(total >= Decimal::ZERO, "Balance must be non-negative");
        Self {
            user_id,
            asset: asset.into(),
            available: total,
            locked: Decimal::ZERO,
            total,
        }
    }

    /// Create an empty balance
    pub fn empty(user_id: UserId, asset: impl Into<String>) -> Self {
        Self::new(user_id, asset, Decimal::ZERO)
    }

    /// Check balance invariant: total = available + locked, all fields >= 0
    pub fn check_invariant(&self) -> bool {
        self.total == self.available + self.locked
            && self.available >= Decimal::ZERO
            && self.locked >= Decimal::ZERO
    }

    /// Credit to available balance
    ///
    /// # Panics
    /// Panics if the amount is negative or the invariant breaks
    pub fn credit(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "Credit amount must be non-negative");

        self.available += amount;
        self.total += amount;

        assert!(self.check_invariant(), "Invariant violated after credit");
    }

    /// Debit from available balance
    ///
    /// # Panics
    /// Panics if amount exceeds available or the invariant breaks
    pub fn debit_available(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "Debit amount must be non-negative");
        assert!(amount <= self.available, "Insufficient available balance");

        self.available -= amount;
        self.total -= amount;

        assert!(self.check_invariant(), "Invariant violated after debit");
    }

    /// Lock a portion of available balance
    ///
    /// # Panics
    /// Panics if amount exceeds available or the invariant breaks
    pub fn lock(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "Lock amount must be non-negative");
        assert!(amount <= self.available, "Insufficient available balance");

        self.available -= amount;
        self.locked += amount;

        assert!(self.check_invariant(), "Invariant violated after lock");
    }

    /// Unlock a portion of locked balance
    ///
    /// # Panics
    /// Panics if amount exceeds locked or the invariant breaks
    pub fn unlock(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "Unlock amount must be non-negative");
        assert!(amount <= self.locked, "Insufficient locked balance");

        self.locked -= amount;
        self.available += amount;

        assert!(self.check_invariant(), "Invariant violated after unlock");
    }
}
