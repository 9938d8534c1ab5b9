//! Crossing detection
//!
//! Eligibility works on effective prices: a market buy bids infinity, a
//! market sell asks zero. Two market orders have no price source at all,
//! so they never cross each other.

use types::numeric::Price;
use types::order::Order;

/// Whether a buy and a sell are price-compatible.
///
/// Limit vs limit crosses when `buy >= sell`. A market order crosses any
/// priced opposite order. Two market orders never cross.
pub fn crosses(buy_price: Option<Price>, sell_price: Option<Price>) -> bool {
    match (buy_price, sell_price) {
        (Some(buy), Some(sell)) => buy >= sell,
        (None, Some(_)) | (Some(_), None) => true,
        (None, None) => false,
    }
}

/// Execution price for an eligible pair: the resting sell's limit price
/// when it has one, otherwise the buy's. Returns None only for two market
/// orders, which are never eligible.
pub fn execution_price(buy: &Order, sell: &Order) -> Option<Price> {
    sell.price.or(buy.price)
}
