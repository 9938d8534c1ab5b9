//! On-chain settlement records
//!
//! A Settlement records the intent to deliver a trade peer-to-peer:
//! exactly one per trade, with two counterparty requests that are signed
//! and confirmed independently. The coordinator never moves funds itself.

use crate::ids::{PairSymbol, SettlementId, TradeId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle of a settlement record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    /// Both counterparty transfers await user signatures
    PendingUserAction,
    /// Both transfers confirmed on-chain (terminal)
    Completed,
    /// System-side failure or a failed transfer (terminal)
    Failed,
}

/// Lifecycle of one counterparty transfer request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Signed,
    Confirmed,
    Failed,
}

/// Transfer direction from the request owner's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Send,
}

/// One on-chain settlement per trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub settlement_id: SettlementId,
    pub trade_id: TradeId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub symbol: PairSymbol,
    pub base_asset: String,
    pub quote_asset: String,
    pub base_amount: Decimal,
    pub quote_amount: Decimal,
    pub buyer_wallet: String,
    pub seller_wallet: String,
    pub status: SettlementStatus,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub created_at: i64, // Unix nanos
}

impl Settlement {
    /// Mark the settlement failed with an error message, bumping retry_count
    /// so callers can distinguish system-side failure from awaiting-signature.
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = SettlementStatus::Failed;
        self.error_message = Some(message.into());
        self.retry_count += 1;
    }

    /// Mark the settlement completed (both transfers confirmed)
    pub fn mark_completed(&mut self) {
        self.status = SettlementStatus::Completed;
    }
}

/// One counterparty transfer request (exactly two per settlement)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub trade_id: TradeId,
    pub user_id: UserId,
    pub counterparty_id: UserId,
    pub direction: Direction,
    pub asset_symbol: String,
    pub amount: Decimal,
    pub from_wallet: String,
    pub to_wallet: String,
    pub status: RequestStatus,
}

impl SettlementRequest {
    /// Whether this request reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, RequestStatus::Confirmed | RequestStatus::Failed)
    }
}
