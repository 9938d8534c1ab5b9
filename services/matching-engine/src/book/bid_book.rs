//! Bid (buy-side) order book
//!
//! Limit bids sort by price descending (best bid first) in a BTreeMap for
//! deterministic iteration. Market bids carry no price and live in a
//! separate FIFO band that outranks every limit level.

use std::collections::{BTreeMap, VecDeque};
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use super::price_level::{BookEntry, PriceLevel};

#[derive(Debug, Clone, Default)]
pub struct BidBook {
    /// Market buys, effective price +infinity, FIFO among themselves
    market: VecDeque<BookEntry>,
    /// Limit levels; BTreeMap iterates ascending, so best bid is last
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an open buy order.
    ///
    /// # Panics
    /// Panics if the order is not a buy.
    pub fn insert(&mut self, order: &Order) {
        assert_eq!(order.side, Side::Buy, "BidBook only holds buy orders");
        let entry = BookEntry {
            order_id: order.order_id,
            user_id: order.user_id,
            remaining_quantity: order.remaining_quantity,
            created_at: order.created_at,
        };
        match order.price {
            Some(price) => self.levels.entry(price).or_default().insert(entry),
            None => self.market.push_back(entry),
        }
    }

    /// Remove an order. `price` is None for market orders.
    pub fn remove(&mut self, order_id: &OrderId, price: Option<Price>) -> bool {
        match price {
            Some(price) => {
                if let Some(level) = self.levels.get_mut(&price) {
                    if level.remove(order_id).is_some() {
                        if level.is_empty() {
                            self.levels.remove(&price);
                        }
                        return true;
                    }
                }
                false
            }
            None => {
                let before = self.market.len();
                self.market.retain(|entry| &entry.order_id != order_id);
                self.market.len() < before
            }
        }
    }

    /// Best limit bid (highest price) and its level quantity.
    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.levels
            .iter()
            .next_back()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// All entries in matching priority order: the market band first, then
    /// limit levels from highest price down, FIFO within each level.
    pub fn priority_entries(&self) -> Vec<BookEntry> {
        let mut entries: Vec<BookEntry> = self.market.iter().cloned().collect();
        for level in self.levels.values().rev() {
            entries.extend(level.iter().cloned());
        }
        entries
    }

    /// Top N limit levels, best first. Market-band quantity is not priced
    /// and does not appear in depth.
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .rev()
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.market.is_empty() && self.levels.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.market.len() + self.levels.values().map(PriceLevel::order_count).sum::<usize>()
    }
}
