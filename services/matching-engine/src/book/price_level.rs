//! Price level with FIFO queue
//!
//! A price level holds all resting orders at one price, in arrival order.
//! Same-price time priority falls out of the queue order.

use std::collections::VecDeque;
use types::ids::{OrderId, UserId};
use types::numeric::Quantity;

/// One resting order reference inside the book.
#[derive(Debug, Clone)]
pub struct BookEntry {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub remaining_quantity: Quantity,
    pub created_at: i64,
}

/// All orders resting at a single price, FIFO.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<BookEntry>,
    total_quantity: Quantity,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an order at the back of the queue (time priority).
    pub fn insert(&mut self, entry: BookEntry) {
        self.total_quantity = self.total_quantity + entry.remaining_quantity;
        self.orders.push_back(entry);
    }

    /// Remove an order by id, returning its remaining quantity.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Quantity> {
        let position = self
            .orders
            .iter()
            .position(|entry| &entry.order_id == order_id)?;
        let entry = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity.saturating_sub(entry.remaining_quantity);
        Some(entry.remaining_quantity)
    }

    /// Entries in time priority order.
    pub fn iter(&self) -> impl Iterator<Item = &BookEntry> {
        self.orders.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(qty: &str, created_at: i64) -> BookEntry {
        BookEntry {
            order_id: OrderId::new(),
            user_id: UserId::new(),
            remaining_quantity: Quantity::from_str(qty).unwrap(),
            created_at,
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut level = PriceLevel::new();
        let first = entry("1.0", 1);
        let second = entry("2.0", 2);
        let first_id = first.order_id;

        level.insert(first);
        level.insert(second);

        assert_eq!(level.iter().next().unwrap().order_id, first_id);
        assert_eq!(level.order_count(), 2);
    }

    #[test]
    fn test_total_quantity_tracks_inserts_and_removals() {
        let mut level = PriceLevel::new();
        let a = entry("1.5", 1);
        let b = entry("2.5", 2);
        let a_id = a.order_id;

        level.insert(a);
        level.insert(b);
        assert_eq!(level.total_quantity(), Quantity::from_str("4.0").unwrap());

        let removed = level.remove(&a_id);
        assert_eq!(removed, Some(Quantity::from_str("1.5").unwrap()));
        assert_eq!(level.total_quantity(), Quantity::from_str("2.5").unwrap());
    }

    #[test]
    fn test_remove_unknown_order() {
        let mut level = PriceLevel::new();
        level.insert(entry("1.0", 1));
        assert_eq!(level.remove(&OrderId::new()), None);
        assert_eq!(level.order_count(), 1);
    }
}
