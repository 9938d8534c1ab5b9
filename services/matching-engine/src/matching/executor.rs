//! Per-match computation
//!
//! Turns an eligible buy/sell pair into a `Trade`: matched quantity is the
//! smaller remaining side, the execution price follows the resting-sell
//! rule, and fees come from the settings snapshot with the buyer paying
//! the taker rate and the seller the maker rate.

use types::order::{Order, Side};
use types::settings::EngineSettings;
use types::trade::{Trade, TradingType};

use super::crossing;

/// Whether a buy and sell from the same user may match each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfTradePolicy {
    /// Match normally; the ledger nets the legs out to the fees
    #[default]
    Allow,
    /// Skip the pairing and move on
    Skip,
}

/// Build the trade for an eligible pairing, or None when the pairing
/// produces no match (not crossing, nothing remaining, no price source,
/// or a skipped self-trade).
pub fn plan_match(
    buy: &Order,
    sell: &Order,
    settings: &EngineSettings,
    policy: SelfTradePolicy,
    trading_type: TradingType,
    now: i64,
) -> Option<Trade> {
    debug_assert_eq!(buy.side, Side::Buy);
    debug_assert_eq!(sell.side, Side::Sell);
    debug_assert_eq!(buy.pair, sell.pair);

    if policy == SelfTradePolicy::Skip && buy.user_id == sell.user_id {
        return None;
    }
    if !crossing::crosses(buy.price, sell.price) {
        return None;
    }
    let quantity = buy.remaining_quantity.min(sell.remaining_quantity);
    if quantity.is_zero() {
        return None;
    }
    let price = crossing::execution_price(buy, sell)?;

    let total_value = quantity.as_decimal() * price.as_decimal();
    let buyer_fee = settings.taker_fee(total_value);
    let seller_fee = settings.maker_fee(total_value);

    Some(Trade::new(
        buy.pair.clone(),
        buy.order_id,
        sell.order_id,
        buy.user_id,
        sell.user_id,
        quantity,
        price,
        buyer_fee,
        seller_fee,
        trading_type,
        now,
    ))
}
