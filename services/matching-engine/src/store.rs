//! Order and trade store
//!
//! Orders are retained forever once placed; lifecycle changes mutate them
//! in place. Trades are an append-only log. The store is single-threaded;
//! the engine wraps it in a mutex.

use std::collections::BTreeMap;
use std::collections::HashMap;

use thiserror::Error;
use types::ids::{OrderId, PairSymbol};
use types::numeric::Quantity;
use types::order::Order;
use types::trade::Trade;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    #[error("Order {order_id} is in terminal state and cannot change")]
    TerminalOrder { order_id: String },
}

/// In-memory order book of record plus the trade log.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: HashMap<OrderId, Order>,
    trades: Vec<Trade>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept an order into the store.
    pub fn place(&mut self, order: Order) -> OrderId {
        let order_id = order.order_id;
        debug_assert!(order.check_invariant());
        self.orders.insert(order_id, order);
        order_id
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// Open orders grouped by pair, each group sorted by creation time
    /// (order id breaks ties deterministically, UUID v7 being
    /// time-ordered).
    pub fn open_orders_by_pair(&self) -> BTreeMap<PairSymbol, Vec<Order>> {
        let mut by_pair: BTreeMap<PairSymbol, Vec<Order>> = BTreeMap::new();
        for order in self.orders.values() {
            if order.is_open() {
                by_pair.entry(order.pair.clone()).or_default().push(order.clone());
            }
        }
        for orders in by_pair.values_mut() {
            orders.sort_by_key(|o| (o.created_at, o.order_id));
        }
        by_pair
    }

    /// Apply a fill to an order, returning the updated copy.
    pub fn apply_fill(
        &mut self,
        order_id: &OrderId,
        quantity: Quantity,
        now: i64,
    ) -> Result<Order, StoreError> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;
        if order.status.is_terminal() {
            return Err(StoreError::TerminalOrder {
                order_id: order_id.to_string(),
            });
        }
        order.add_fill(quantity, now);
        Ok(order.clone())
    }

    /// Cancel a pending or partially filled order.
    pub fn cancel(&mut self, order_id: &OrderId) -> Result<Order, StoreError> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;
        if order.status.is_terminal() {
            return Err(StoreError::TerminalOrder {
                order_id: order_id.to_string(),
            });
        }
        order.cancel();
        Ok(order.clone())
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn trades_for_pair(&self, pair: &PairSymbol) -> Vec<&Trade> {
        self.trades.iter().filter(|t| &t.pair == pair).collect()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}
