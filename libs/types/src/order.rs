//! Order lifecycle types
//!
//! Orders are created by the placement flow, mutated only by the matching
//! engine, and never destroyed (retained for audit).

use crate::ids::{OrderId, PairSymbol, UserId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order pricing model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Execute at whatever the opposite side offers
    Market,
    /// Execute at the limit price or better
    Limit,
}

/// Order status
///
/// Transitions: Pending → PartiallyFilled → Filled, or Pending → Cancelled.
/// Filled and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Accepted and awaiting matching
    Pending,
    /// Partially matched
    PartiallyFilled,
    /// Completely matched (terminal)
    Filled,
    /// Cancelled before completion (terminal)
    Cancelled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// Complete order structure
///
/// Invariant: `filled_quantity + remaining_quantity == quantity` at all times.
/// `price` is None exactly when `order_type` is Market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub pair: PairSymbol,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Option<Price>,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub status: OrderStatus,
    pub created_at: i64, // Unix nanos
    pub filled_at: Option<i64>,
}

impl Order {
    /// Create a new pending limit order
    pub fn new_limit(
        user_id: UserId,
        pair: PairSymbol,
        side: Side,
        price: Price,
        quantity: Quantity,
        timestamp: i64,
    ) -> Self {
        Self::new(user_id, pair, side, OrderType::Limit, Some(price), quantity, timestamp)
    }

    /// Create a new pending market order
    pub fn new_market(
        user_id: UserId,
        pair: PairSymbol,
        side: Side,
        quantity: Quantity,
        timestamp: i64,
    ) -> Self {
        Self::new(user_id, pair, side, OrderType::Market, None, quantity, timestamp)
    }

    fn new(
        user_id: UserId,
        pair: PairSymbol,
        side: Side,
        order_type: OrderType,
        price: Option<Price>,
        quantity: Quantity,
        timestamp: i64,
    ) -> Self {
        assert_eq!(
            price.is_none(),
            order_type == OrderType::Market,
            "Market orders carry no price; limit orders require one"
        );
        Self {
            order_id: OrderId::new(),
            user_id,
            pair,
            side,
            order_type,
            price,
            quantity,
            filled_quantity: Quantity::zero(),
            remaining_quantity: quantity,
            status: OrderStatus::Pending,
            created_at: timestamp,
            filled_at: None,
        }
    }

    /// Check quantity invariant: filled + remaining = total
    pub fn check_invariant(&self) -> bool {
        self.filled_quantity + self.remaining_quantity == self.quantity
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    /// Check if order is still matchable
    pub fn is_open(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::PartiallyFilled)
    }

    /// Update filled quantity and adjust status
    ///
    /// # Panics
    /// Panics if the fill would exceed total quantity or violate invariants
    pub fn add_fill(&mut self, fill_quantity: Quantity, timestamp: i64) {
        let new_filled = self.filled_quantity + fill_quantity;

        assert!(
            new_filled.as_decimal() <= self.quantity.as_decimal(),
            "Fill would exceed order quantity"
        );

        self.filled_quantity = new_filled;
        self.remaining_quantity = self.quantity.saturating_sub(new_filled);

        if self.is_filled() {
            self.status = OrderStatus::Filled;
            self.filled_at = Some(timestamp);
        } else {
            self.status = OrderStatus::PartiallyFilled;
        }

        assert!(self.check_invariant(), "Invariant violated after fill");
    }

    /// Cancel the order
    ///
    /// # Panics
    /// Panics if order is already in terminal state
    pub fn cancel(&mut self) {
        assert!(!self.status.is_terminal(), "Cannot cancel terminal order");
        self.status = OrderStatus::Cancelled;
    }
}
