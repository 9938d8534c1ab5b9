//! Trade execution types
//!
//! A trade links exactly one resting buy order and one resting sell order.
//! Partial fills of either side create a new trade per match, never a
//! merged record. Trades are immutable once created.

use crate::ids::{OrderId, PairSymbol, TradeId, UserId};
use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a trade settles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingType {
    /// Balances move inside the platform ledger, no external signature
    Custodial,
    /// Counterparties sign and broadcast their own transfers
    Onchain,
}

/// Immutable record of one executed match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub pair: PairSymbol,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub quantity: Quantity,
    pub price: Price,
    pub total_value: Decimal,
    pub buyer_fee: Decimal,
    pub seller_fee: Decimal,
    pub trading_type: TradingType,
    pub created_at: i64, // Unix nanos
}

impl Trade {
    /// Create a new trade record
    ///
    /// # Panics
    /// Panics if the quantity is zero (trades record actual executions only)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pair: PairSymbol,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        buyer_id: UserId,
        seller_id: UserId,
        quantity: Quantity,
        price: Price,
        buyer_fee: Decimal,
        seller_fee: Decimal,
        trading_type: TradingType,
        created_at: i64,
    ) -> Self {
        assert!(!quantity.is_zero(), "Trade quantity must be positive");
        let total_value = quantity.as_decimal() * price.as_decimal();
        Self {
            trade_id: TradeId::new(),
            pair,
            buy_order_id,
            sell_order_id,
            buyer_id,
            seller_id,
            quantity,
            price,
            total_value,
            buyer_fee,
            seller_fee,
            trading_type,
            created_at,
        }
    }

    /// Whether the buyer and seller are the same user
    pub fn is_self_trade(&self) -> bool {
        self.buyer_id == self.seller_id
    }
}
