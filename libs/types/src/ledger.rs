//! Append-only trading ledger entries
//!
//! One entry per balance mutation, capturing balance_before/balance_after
//! so the full balance history can be reconstructed and drift detected.

use crate::ids::{EntryId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a balance mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Credit,
    Debit,
}

/// What a ledger entry references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    Trade,
    Order,
    Settlement,
    Adjustment,
}

/// A single append-only audit entry for one balance mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingLedgerEntry {
    pub entry_id: EntryId,
    pub user_id: UserId,
    pub asset: String,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub reference_type: ReferenceType,
    pub reference_id: String,
    pub notes: String,
    pub created_at: i64, // Unix nanos
}

impl TradingLedgerEntry {
    /// Create a new entry
    ///
    /// # Panics
    /// Panics unless `balance_after == balance_before ± amount` per entry_type
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        asset: impl Into<String>,
        entry_type: EntryType,
        amount: Decimal,
        balance_before: Decimal,
        balance_after: Decimal,
        reference_type: ReferenceType,
        reference_id: impl Into<String>,
        notes: impl Into<String>,
        created_at: i64,
    ) -> Self {
        let expected = match entry_type {
            EntryType::Credit => balance_before + amount,
            EntryType::Debit => balance_before - amount,
        };
        assert_eq!(balance_after, expected, "Ledger entry arithmetic mismatch");

        Self {
            entry_id: EntryId::new(),
            user_id,
            asset: asset.into(),
            entry_type,
            amount,
            balance_before,
            balance_after,
            reference_type,
            reference_id: reference_id.into(),
            notes: notes.into(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_entry_arithmetic() {
        let entry = TradingLedgerEntry::new(
            UserId::new(),
            "BTC",
            EntryType::Credit,
            Decimal::from(5),
            Decimal::from(10),
            Decimal::from(15),
            ReferenceType::Trade,
            "trade-1",
            "base leg",
            1708123456789000000,
        );
        assert_eq!(entry.balance_after, Decimal::from(15));
    }

    #[test]
    #[should_panic(expected = "Ledger entry arithmetic mismatch")]
    fn test_debit_entry_mismatch_panics() {
        TradingLedgerEntry::new(
            UserId::new(),
            "BTC",
            EntryType::Debit,
            Decimal::from(5),
            Decimal::from(10),
            Decimal::from(15), // should be 5
            ReferenceType::Trade,
            "trade-1",
            "base leg",
            1708123456789000000,
        );
    }

    #[test]
    fn test_entry_serialization() {
        let entry = TradingLedgerEntry::new(
            UserId::new(),
            "USDT",
            EntryType::Debit,
            Decimal::from(50),
            Decimal::from(100),
            Decimal::from(50),
            ReferenceType::Settlement,
            "settlement-1",
            "quote leg",
            1708123456789000000,
        );
        let json = serde_json::to_string(&entry).unwrap();
        let back: TradingLedgerEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
