//! Atomic trade settlement
//!
//! `Ledger` wraps the balance book in a mutex and applies a trade's four
//! balance legs as a single transactional unit. All preconditions are
//! validated before the first leg mutates anything, so a settlement either
//! applies completely or leaves the book untouched.

use std::sync::{Mutex, MutexGuard, TryLockError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use types::balance::WalletBalance;
use types::errors::LedgerError;
use types::ids::UserId;
use types::ledger::ReferenceType;
use types::numeric::{Price, Quantity};
use types::time;

use crate::store::BalanceBook;

/// Lock acquisition attempts before a settlement gives up.
const DEFAULT_MAX_LOCK_ATTEMPTS: u32 = 64;

/// Arguments for one atomic trade settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleTrade {
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub base_asset: String,
    pub quote_asset: String,
    pub quantity: Quantity,
    pub price: Price,
    /// Buyer-side fee, denominated in the quote asset
    pub buyer_fee: Decimal,
    /// Seller-side fee, denominated in the quote asset
    pub seller_fee: Decimal,
    /// Trade id the ledger entries reference
    pub reference_id: String,
}

impl SettleTrade {
    /// Gross value of the trade in the quote asset
    pub fn total_value(&self) -> Decimal {
        self.quantity.as_decimal() * self.price.as_decimal()
    }
}

/// Thread-safe balance ledger exposing the atomic settlement primitive.
#[derive(Debug)]
pub struct Ledger {
    book: Mutex<BalanceBook>,
    max_lock_attempts: u32,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            book: Mutex::new(BalanceBook::new()),
            max_lock_attempts: DEFAULT_MAX_LOCK_ATTEMPTS,
        }
    }

    /// Override the lock retry budget (mainly for tests)
    pub fn with_max_lock_attempts(max_lock_attempts: u32) -> Self {
        Self {
            book: Mutex::new(BalanceBook::new()),
            max_lock_attempts,
        }
    }

    /// Bounded try-lock loop over the balance book. A poisoned mutex is
    /// recovered; the book's invariants are re-checkable at any point.
    fn acquire(&self) -> Result<MutexGuard<'_, BalanceBook>, LedgerError> {
        for attempt in 0..self.max_lock_attempts {
            match self.book.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => {
                    if attempt + 1 < self.max_lock_attempts {
                        std::thread::yield_now();
                    }
                }
            }
        }
        warn!(
            attempts = self.max_lock_attempts,
            "balance book lock retry budget exhausted"
        );
        Err(LedgerError::ContentionExceeded {
            attempts: self.max_lock_attempts,
        })
    }

    /// Settle one trade atomically: seller delivers base, buyer delivers
    /// quote gross of their fee, seller receives quote net of their fee,
    /// and both fees accrue to the platform treasury.
    pub fn settle_trade(&self, args: &SettleTrade) -> Result<(), LedgerError> {
        let quantity = args.quantity.as_decimal();
        if quantity <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if args.buyer_fee < Decimal::ZERO || args.seller_fee < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let total_value = args.total_value();
        if args.seller_fee >= total_value {
            return Err(LedgerError::InvalidAmount);
        }
        let gross_quote = total_value
            .checked_add(args.buyer_fee)
            .ok_or(LedgerError::Overflow)?;
        // Both fees are below gross_quote, so this sum cannot overflow.
        let fee_total = args.buyer_fee + args.seller_fee;

        let mut book = self.acquire()?;
        let now = time::now_nanos();

        // Validate every leg before mutating anything, overflow included.
        book.require_available(&args.seller_id, &args.base_asset, quantity)?;
        book.require_available(&args.buyer_id, &args.quote_asset, gross_quote)?;
        book.check_credit_headroom(&args.buyer_id, &args.base_asset, quantity)?;
        book.check_credit_headroom(
            &args.seller_id,
            &args.quote_asset,
            total_value - args.seller_fee,
        )?;
        book.fees_collected(&args.quote_asset)
            .checked_add(fee_total)
            .ok_or(LedgerError::Overflow)?;

        // All legs are now guaranteed to succeed.
        book.debit(
            args.seller_id,
            &args.base_asset,
            quantity,
            ReferenceType::Trade,
            &args.reference_id,
            "trade settlement: deliver base",
            now,
        )?;
        book.credit(
            args.buyer_id,
            &args.base_asset,
            quantity,
            ReferenceType::Trade,
            &args.reference_id,
            "trade settlement: receive base",
            now,
        )?;
        book.debit(
            args.buyer_id,
            &args.quote_asset,
            gross_quote,
            ReferenceType::Trade,
            &args.reference_id,
            "trade settlement: pay quote incl. fee",
            now,
        )?;
        book.credit(
            args.seller_id,
            &args.quote_asset,
            total_value - args.seller_fee,
            ReferenceType::Trade,
            &args.reference_id,
            "trade settlement: receive quote net of fee",
            now,
        )?;
        book.accrue_fee(&args.quote_asset, fee_total)?;

        debug!(
            trade_id = %args.reference_id,
            %quantity,
            %total_value,
            "trade settled"
        );
        Ok(())
    }

    // ─────────────────── Pass-through balance operations ───────────────────

    /// Credit an external deposit into a user's available balance.
    pub fn deposit(
        &self,
        user_id: UserId,
        asset: &str,
        amount: Decimal,
        reference_id: &str,
    ) -> Result<(), LedgerError> {
        let mut book = self.acquire()?;
        let now = time::now_nanos();
        book.credit(
            user_id,
            asset,
            amount,
            ReferenceType::Adjustment,
            reference_id,
            "deposit",
            now,
        )
    }

    /// Reserve funds for an open order.
    pub fn lock_funds(
        &self,
        user_id: UserId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.acquire()?.lock(user_id, asset, amount)
    }

    /// Release reserved funds back to available.
    pub fn unlock_funds(
        &self,
        user_id: UserId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.acquire()?.unlock(user_id, asset, amount)
    }

    /// Snapshot of a user's balance for one asset.
    pub fn balance(&self, user_id: &UserId, asset: &str) -> Result<Option<WalletBalance>, LedgerError> {
        Ok(self.acquire()?.balance(user_id, asset).cloned())
    }

    /// Available balance for a user/asset (zero when no row exists).
    pub fn available(&self, user_id: &UserId, asset: &str) -> Result<Decimal, LedgerError> {
        Ok(self.acquire()?.available(user_id, asset))
    }

    /// Platform fees accrued for an asset.
    pub fn fees_collected(&self, asset: &str) -> Result<Decimal, LedgerError> {
        Ok(self.acquire()?.fees_collected(asset))
    }

    /// Number of ledger entries written so far.
    pub fn entry_count(&self) -> Result<usize, LedgerError> {
        Ok(self.acquire()?.entries().len())
    }

    /// Run a read-only closure against the balance book.
    pub fn with_book<T>(&self, f: impl FnOnce(&BalanceBook) -> T) -> Result<T, LedgerError> {
        Ok(f(&*self.acquire()?))
    }
}
