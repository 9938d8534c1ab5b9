//! Engine event definitions
//!
//! Everything the matching and settlement cores announce to the outside
//! world. Events are facts about state that has already changed; consumers
//! can never influence matching by reacting to them.

use serde::{Deserialize, Serialize};
use types::ids::{OrderId, PairSymbol, UserId};
use types::numeric::Quantity;
use types::order::OrderStatus;
use types::settlement::Settlement;
use types::trade::Trade;

use crate::topic::Topic;

/// Events published by the engine, one topic each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum EngineEvent {
    /// The book shape for a pair changed (new order, fill, or cancel)
    OrderBookChanged { pair: PairSymbol },

    /// A trade executed and settled
    TradeExecuted { trade: Trade },

    /// An order moved through its lifecycle
    OrderStatusChanged {
        order_id: OrderId,
        user_id: UserId,
        pair: PairSymbol,
        status: OrderStatus,
        filled_quantity: Quantity,
        remaining_quantity: Quantity,
    },

    /// An on-chain settlement was created for a user
    SettlementCreated {
        user_id: UserId,
        settlement: Settlement,
    },
}

impl EngineEvent {
    /// The channel this event is delivered on.
    pub fn topic(&self) -> Topic {
        match self {
            EngineEvent::OrderBookChanged { pair } => Topic::orderbook(pair),
            EngineEvent::TradeExecuted { trade } => Topic::trades(&trade.pair),
            EngineEvent::OrderStatusChanged { user_id, .. } => Topic::orders(user_id),
            EngineEvent::SettlementCreated { user_id, .. } => Topic::settlements(user_id),
        }
    }

    /// Event type as a string label for logging.
    pub fn event_type_label(&self) -> &'static str {
        match self {
            EngineEvent::OrderBookChanged { .. } => "OrderBookChanged",
            EngineEvent::TradeExecuted { .. } => "TradeExecuted",
            EngineEvent::OrderStatusChanged { .. } => "OrderStatusChanged",
            EngineEvent::SettlementCreated { .. } => "SettlementCreated",
        }
    }
}
