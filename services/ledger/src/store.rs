//! Balance book: custodial balances, ledger entries, and fee treasury
//!
//! Balances are stored as `HashMap<(UserId, asset), WalletBalance>`. Every
//! mutation appends one `TradingLedgerEntry`. The book itself is
//! single-threaded; `settle::Ledger` wraps it for shared access.

use rust_decimal::Decimal;
use std::collections::HashMap;
use types::balance::WalletBalance;
use types::errors::LedgerError;
use types::ids::UserId;
use types::ledger::{EntryType, ReferenceType, TradingLedgerEntry};

/// In-memory balance book with an append-only audit log.
#[derive(Debug, Default)]
pub struct BalanceBook {
    /// Balances: (user, asset) -> balance
    balances: HashMap<(UserId, String), WalletBalance>,
    /// Append-only ledger, one entry per balance mutation
    entries: Vec<TradingLedgerEntry>,
    /// Platform fee treasury: asset -> accrued fees
    fees_collected: HashMap<String, Decimal>,
}

impl BalanceBook {
    /// Create an empty balance book
    pub fn new() -> Self {
        Self::default()
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Get the balance row for a user/asset, if any
    pub fn balance(&self, user_id: &UserId, asset: &str) -> Option<&WalletBalance> {
        self.balances.get(&(*user_id, asset.to_string()))
    }

    /// Available balance for a user/asset (zero when no row exists)
    pub fn available(&self, user_id: &UserId, asset: &str) -> Decimal {
        self.balance(user_id, asset)
            .map(|b| b.available)
            .unwrap_or(Decimal::ZERO)
    }

    /// Total balance for a user/asset (zero when no row exists)
    pub fn total(&self, user_id: &UserId, asset: &str) -> Decimal {
        self.balance(user_id, asset)
            .map(|b| b.total)
            .unwrap_or(Decimal::ZERO)
    }

    /// The full append-only ledger
    pub fn entries(&self) -> &[TradingLedgerEntry] {
        &self.entries
    }

    /// Fees accrued to the platform for an asset
    pub fn fees_collected(&self, asset: &str) -> Decimal {
        self.fees_collected
            .get(asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Verify `total == available + locked` for every row
    pub fn check_invariants(&self) -> bool {
        self.balances.values().all(|b| b.check_invariant())
    }

    // ───────────────────────── Primitives ─────────────────────────

    /// Credit a user's available balance (deposit boundary).
    pub fn credit(
        &mut self,
        user_id: UserId,
        asset: &str,
        amount: Decimal,
        reference_type: ReferenceType,
        reference_id: &str,
        notes: &str,
        now: i64,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let balance = self.balance_row(user_id, asset);
        let before = balance.total;
        let after = before.checked_add(amount).ok_or(LedgerError::Overflow)?;
        balance.credit(amount);
        self.record(
            user_id,
            asset,
            EntryType::Credit,
            amount,
            before,
            after,
            reference_type,
            reference_id,
            notes,
            now,
        );
        Ok(())
    }

    /// Debit a user's available balance.
    pub fn debit(
        &mut self,
        user_id: UserId,
        asset: &str,
        amount: Decimal,
        reference_type: ReferenceType,
        reference_id: &str,
        notes: &str,
        now: i64,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        self.require_available(&user_id, asset, amount)?;
        let balance = self.balance_row(user_id, asset);
        let before = balance.total;
        balance.debit_available(amount);
        let after = balance.total;
        self.record(
            user_id,
            asset,
            EntryType::Debit,
            amount,
            before,
            after,
            reference_type,
            reference_id,
            notes,
            now,
        );
        Ok(())
    }

    /// Move funds from available to locked (order placement boundary).
    /// Total is unchanged, so no ledger entry is appended.
    pub fn lock(
        &mut self,
        user_id: UserId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        self.require_available(&user_id, asset, amount)?;
        self.balance_row(user_id, asset).lock(amount);
        Ok(())
    }

    /// Move funds from locked back to available (order cancel boundary).
    pub fn unlock(
        &mut self,
        user_id: UserId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let locked = self
            .balance(&user_id, asset)
            .map(|b| b.locked)
            .unwrap_or(Decimal::ZERO);
        if locked < amount {
            return Err(LedgerError::InsufficientBalance {
                user_id: user_id.to_string(),
                asset: asset.to_string(),
                required: amount.to_string(),
                available: locked.to_string(),
            });
        }
        self.balance_row(user_id, asset).unlock(amount);
        Ok(())
    }

    /// Accrue a platform fee in the given asset.
    pub(crate) fn accrue_fee(&mut self, asset: &str, amount: Decimal) -> Result<(), LedgerError> {
        let accrued = self
            .fees_collected
            .entry(asset.to_string())
            .or_insert(Decimal::ZERO);
        *accrued = accrued.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Fail with `Overflow` if crediting `amount` would overflow the row's total.
    pub(crate) fn check_credit_headroom(
        &self,
        user_id: &UserId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.total(user_id, asset)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Fail with `InsufficientBalance` unless the user has `required` available.
    pub(crate) fn require_available(
        &self,
        user_id: &UserId,
        asset: &str,
        required: Decimal,
    ) -> Result<(), LedgerError> {
        let available = self.available(user_id, asset);
        if available < required {
            return Err(LedgerError::InsufficientBalance {
                user_id: user_id.to_string(),
                asset: asset.to_string(),
                required: required.to_string(),
                available: available.to_string(),
            });
        }
        Ok(())
    }

    /// Get or create the balance row for a user/asset.
    pub(crate) fn balance_row(&mut self, user_id: UserId, asset: &str) -> &mut WalletBalance {
        self.balances
            .entry((user_id, asset.to_string()))
            .or_insert_with(|| WalletBalance::empty(user_id, asset))
    }

    /// Append one audit entry.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn record(
        &mut self,
        user_id: UserId,
        asset: &str,
        entry_type: EntryType,
        amount: Decimal,
        before: Decimal,
        after: Decimal,
        reference_type: ReferenceType,
        reference_id: &str,
        notes: &str,
        now: i64,
    ) {
        self.entries.push(TradingLedgerEntry::new(
            user_id,
            asset,
            entry_type,
            amount,
            before,
            after,
            reference_type,
            reference_id,
            notes,
            now,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fund(book: &mut BalanceBook, user: UserId, asset: &str, amount: u64) {
        book.credit(
            user,
            asset,
            Decimal::from(amount),
            ReferenceType::Adjustment,
            "seed",
            "test deposit",
            1708123456789000000,
        )
        .unwrap();
    }

    #[test]
    fn test_credit_creates_row_and_entry() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        fund(&mut book, user, "BTC", 10);

        assert_eq!(book.available(&user, "BTC"), Decimal::from(10));
        assert_eq!(book.total(&user, "BTC"), Decimal::from(10));
        assert_eq!(book.entries().len(), 1);
        assert_eq!(book.entries()[0].entry_type, EntryType::Credit);
        assert!(book.check_invariants());
    }

    #[test]
    fn test_debit_requires_available() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        fund(&mut book, user, "BTC", 5);

        let result = book.debit(
            user,
            "BTC",
            Decimal::from(6),
            ReferenceType::Adjustment,
            "tx",
            "",
            0,
        );
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
        // Failed debit leaves no entry behind
        assert_eq!(book.entries().len(), 1);
        assert_eq!(book.available(&user, "BTC"), Decimal::from(5));
    }

    #[test]
    fn test_debit_unknown_user_is_insufficient() {
        let mut book = BalanceBook::new();
        let result = book.debit(
            UserId::new(),
            "BTC",
            Decimal::from(1),
            ReferenceType::Adjustment,
            "tx",
            "",
            0,
        );
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_lock_and_unlock_keep_total() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        fund(&mut book, user, "USDT", 1000);

        book.lock(user, "USDT", Decimal::from(400)).unwrap();
        let b = book.balance(&user, "USDT").unwrap();
        assert_eq!(b.available, Decimal::from(600));
        assert_eq!(b.locked, Decimal::from(400));
        assert_eq!(b.total, Decimal::from(1000));
        // Lock/unlock move within the row; no ledger entry
        assert_eq!(book.entries().len(), 1);

        book.unlock(user, "USDT", Decimal::from(400)).unwrap();
        assert_eq!(book.available(&user, "USDT"), Decimal::from(1000));
        assert!(book.check_invariants());
    }

    #[test]
    fn test_unlock_more_than_locked_fails() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        fund(&mut book, user, "USDT", 100);
        book.lock(user, "USDT", Decimal::from(30)).unwrap();

        let result = book.unlock(user, "USDT", Decimal::from(31));
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        let result = book.credit(
            user,
            "BTC",
            Decimal::ZERO,
            ReferenceType::Adjustment,
            "tx",
            "",
            0,
        );
        assert_eq!(result, Err(LedgerError::InvalidAmount));
    }

    #[test]
    fn test_fee_accrual() {
        let mut book = BalanceBook::new();
        book.accrue_fee("USDT", Decimal::new(5, 2)).unwrap();
        book.accrue_fee("USDT", Decimal::new(25, 3)).unwrap();
        assert_eq!(book.fees_collected("USDT"), Decimal::new(75, 3));
        assert_eq!(book.fees_collected("BTC"), Decimal::ZERO);
    }

    #[test]
    fn test_credit_overflow_rejected_before_mutation() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        book.credit(
            user,
            "BTC",
            Decimal::MAX,
            ReferenceType::Adjustment,
            "seed",
            "",
            0,
        )
        .unwrap();

        let result = book.credit(
            user,
            "BTC",
            Decimal::from(1),
            ReferenceType::Adjustment,
            "tx",
            "",
            0,
        );
        assert_eq!(result, Err(LedgerError::Overflow));
        // Row and ledger untouched by the failed credit
        assert_eq!(book.total(&user, "BTC"), Decimal::MAX);
        assert_eq!(book.entries().len(), 1);
        assert!(book.check_invariants());
    }

    #[test]
    fn test_fee_accrual_overflow_rejected() {
        let mut book = BalanceBook::new();
        book.accrue_fee("USDT", Decimal::MAX).unwrap();
        assert_eq!(
            book.accrue_fee("USDT", Decimal::from(1)),
            Err(LedgerError::Overflow)
        );
        assert_eq!(book.fees_collected("USDT"), Decimal::MAX);
    }

    #[test]
    fn test_ledger_entries_reconstruct_balance() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        fund(&mut book, user, "BTC", 10);
        book.debit(user, "BTC", Decimal::from(3), ReferenceType::Trade, "t1", "", 0)
            .unwrap();
        book.credit(user, "BTC", Decimal::from(7), ReferenceType::Trade, "t2", "", 0)
            .unwrap();

        // Replaying entries yields the current total
        let mut replayed = Decimal::ZERO;
        for entry in book.entries() {
            assert_eq!(entry.balance_before, replayed);
            replayed = entry.balance_after;
        }
        assert_eq!(replayed, book.total(&user, "BTC"));
    }

    proptest! {
        /// Random primitive sequences never break the balance invariant.
        #[test]
        fn prop_invariant_holds(ops in proptest::collection::vec((0u8..4, 1u64..1000), 1..60)) {
            let mut book = BalanceBook::new();
            let user = UserId::new();

            for (op, amount) in ops {
                let amount = Decimal::from(amount);
                // Failed operations are fine; broken invariants are not.
                let _ = match op {
                    0 => book.credit(user, "X", amount, ReferenceType::Adjustment, "p", "", 0),
                    1 => book.debit(user, "X", amount, ReferenceType::Adjustment, "p", "", 0),
                    2 => book.lock(user, "X", amount),
                    _ => book.unlock(user, "X", amount),
                };
                prop_assert!(book.check_invariants());
                if let Some(b) = book.balance(&user, "X") {
                    prop_assert!(b.available >= Decimal::ZERO);
                    prop_assert!(b.locked >= Decimal::ZERO);
                }
            }
        }
    }
}
