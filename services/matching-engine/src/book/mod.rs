//! Indexed order book
//!
//! One `PairBook` per trading pair, rebuilt from open orders at the start
//! of every matching pass. Indexing by side and price turns "walk all open
//! orders in priority order" into two ordered traversals.

mod ask_book;
mod bid_book;
mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::{BookEntry, PriceLevel};

use serde::{Deserialize, Serialize};
use types::ids::PairSymbol;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

/// Both sides of one pair's book.
#[derive(Debug, Clone)]
pub struct PairBook {
    pub pair: PairSymbol,
    pub bids: BidBook,
    pub asks: AskBook,
}

impl PairBook {
    /// Build the book from the pair's open orders. Non-open and
    /// zero-remaining orders are ignored.
    pub fn build<'a>(pair: PairSymbol, orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut bids = BidBook::new();
        let mut asks = AskBook::new();
        for order in orders {
            if !order.is_open() || order.remaining_quantity.is_zero() {
                continue;
            }
            match order.side {
                Side::Buy => bids.insert(order),
                Side::Sell => asks.insert(order),
            }
        }
        Self { pair, bids, asks }
    }

    /// Top-N depth for both sides.
    pub fn depth_snapshot(&self, depth: usize) -> BookSnapshot {
        BookSnapshot {
            pair: self.pair.clone(),
            bids: self.bids.depth_snapshot(depth),
            asks: self.asks.depth_snapshot(depth),
        }
    }
}

/// Aggregated depth per side, best level first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub pair: PairSymbol,
    pub bids: Vec<(Price, Quantity)>,
    pub asks: Vec<(Price, Quantity)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::UserId;

    #[test]
    fn test_build_skips_closed_orders() {
        let pair = PairSymbol::new("BTC/USDT");
        let open = Order::new_limit(
            UserId::new(),
            pair.clone(),
            Side::Buy,
            Price::from_u64(50000),
            Quantity::from_u64(1),
            1,
        );
        let mut cancelled = Order::new_limit(
            UserId::new(),
            pair.clone(),
            Side::Sell,
            Price::from_u64(51000),
            Quantity::from_u64(1),
            2,
        );
        cancelled.cancel();

        let book = PairBook::build(pair, [&open, &cancelled]);
        assert_eq!(book.bids.order_count(), 1);
        assert!(book.asks.is_empty());
    }

    #[test]
    fn test_depth_snapshot_both_sides() {
        let pair = PairSymbol::new("BTC/USDT");
        let bid = Order::new_limit(
            UserId::new(),
            pair.clone(),
            Side::Buy,
            Price::from_u64(49000),
            Quantity::from_u64(2),
            1,
        );
        let ask = Order::new_limit(
            UserId::new(),
            pair.clone(),
            Side::Sell,
            Price::from_u64(51000),
            Quantity::from_u64(3),
            2,
        );

        let book = PairBook::build(pair, [&bid, &ask]);
        let snapshot = book.depth_snapshot(10);
        assert_eq!(snapshot.bids, vec![(Price::from_u64(49000), Quantity::from_u64(2))]);
        assert_eq!(snapshot.asks, vec![(Price::from_u64(51000), Quantity::from_u64(3))]);
    }
}
