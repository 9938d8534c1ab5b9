//! Ask (sell-side) order book
//!
//! Limit asks sort by price ascending (best ask first). Market sells have
//! effective price zero, so their FIFO band outranks every limit level.

use std::collections::{BTreeMap, VecDeque};
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use super::price_level::{BookEntry, PriceLevel};

#[derive(Debug, Clone, Default)]
pub struct AskBook {
    /// Market sells, effective price zero, FIFO among themselves
    market: VecDeque<BookEntry>,
    /// Limit levels; best ask is the first key
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an open sell order.
    ///
    /// # Panics
    /// Panics if the order is not a sell.
    pub fn insert(&mut self, order: &Order) {
        assert_eq!(order.side, Side::Sell, "AskBook only holds sell orders");
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

    /// Best limit ask (lowest price) and its level quantity.
    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.levels
            .iter()
            .next()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// All entries in matching priority order: the market band first, then
    /// limit levels from lowest price up, FIFO within each level.
    pub fn priority_entries(&self) -> Vec<BookEntry> {
        let mut entries: Vec<BookEntry> = self.market.iter().cloned().collect();
        for level in self.levels.values() {
            entries.extend(level.iter().cloned());
        }
        entries
    }

    /// Top N limit levels, best first.
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
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

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{PairSymbol, UserId};

    fn limit_sell(price: u64, qty: &str, at: i64) -> Order {
        Order::new_limit(
            UserId::new(),
            PairSymbol::new("BTC/USDT"),
            Side::Sell,
            Price::from_u64(price),
            Quantity::from_str(qty).unwrap(),
            at,
        )
    }

    fn market_sell(qty: &str, at: i64) -> Order {
        Order::new_market(
            UserId::new(),
            PairSymbol::new("BTC/USDT"),
            Side::Sell,
            Quantity::from_str(qty).unwrap(),
            at,
        )
    }

    #[test]
    fn test_best_ask_is_lowest_price() {
        let mut book = AskBook::new();
        book.insert(&limit_sell(50000, "1.0", 1));
        book.insert(&limit_sell(49000, "2.0", 2));
        book.insert(&limit_sell(51000, "1.5", 3));

        let (best_price, _) = book.best_ask().unwrap();
        assert_eq!(best_price, Price::from_u64(49000));
    }

    #[test]
    fn test_priority_market_band_first_then_ascending_price() {
        let mut book = AskBook::new();
        let l1 = limit_sell(50000, "1.0", 1);
        let l2 = limit_sell(49000, "1.0", 2);
        let m1 = market_sell("1.0", 3);

        book.insert(&l1);
        book.insert(&l2);
        book.insert(&m1);

        let ids: Vec<OrderId> = book
            .priority_entries()
            .iter()
            .map(|e| e.order_id)
            .collect();
        assert_eq!(ids, vec![m1.order_id, l2.order_id, l1.order_id]);
    }

    #[test]
    #[should_panic(expected = "AskBook only holds sell orders")]
    fn test_buy_order_rejected() {
        let mut book = AskBook::new();
        let buy = Order::new_limit(
            UserId::new(),
            PairSymbol::new("BTC/USDT"),
            Side::Buy,
            Price::from_u64(50000),
            Quantity::from_u64(1),
            1,
        );
        book.insert(&buy);
    }
}
