//! Topic channels
//!
//! A topic is `{kind}:{key}`. Pair-scoped kinds key on the trading pair,
//! user-scoped kinds key on the user id.

use std::fmt;

use serde::{Deserialize, Serialize};
use types::ids::{PairSymbol, UserId};

/// The four channel families consumers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicKind {
    /// Book shape changed for a pair
    Orderbook,
    /// Trades executed on a pair
    Trades,
    /// Order lifecycle updates for one user
    Orders,
    /// Settlement lifecycle updates for one user
    Settlements,
}

impl TopicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicKind::Orderbook => "orderbook",
            TopicKind::Trades => "trades",
            TopicKind::Orders => "orders",
            TopicKind::Settlements => "settlements",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "orderbook" => Some(TopicKind::Orderbook),
            "trades" => Some(TopicKind::Trades),
            "orders" => Some(TopicKind::Orders),
            "settlements" => Some(TopicKind::Settlements),
            _ => None,
        }
    }
}

/// A fully-qualified channel name, e.g. `trades:BTC/USDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    pub kind: TopicKind,
    pub key: String,
}

impl Topic {
    pub fn orderbook(pair: &PairSymbol) -> Self {
        Self {
            kind: TopicKind::Orderbook,
            key: pair.as_str().to_string(),
        }
    }

    pub fn trades(pair: &PairSymbol) -> Self {
        Self {
            kind: TopicKind::Trades,
            key: pair.as_str().to_string(),
        }
    }

    pub fn orders(user_id: &UserId) -> Self {
        Self {
            kind: TopicKind::Orders,
            key: user_id.to_string(),
        }
    }

    pub fn settlements(user_id: &UserId) -> Self {
        Self {
            kind: TopicKind::Settlements,
            key: user_id.to_string(),
        }
    }

    /// Parse a `{kind}:{key}` channel string. The key may itself contain
    /// separators (pair symbols do), so only the first `:` splits.
    pub fn parse(channel: &str) -> Option<Self> {
        let (kind, key) = channel.split_once(':')?;
        if key.is_empty() {
            return None;
        }
        Some(Self {
            kind: TopicKind::from_str(kind)?,
            key: key.to_string(),
        })
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.key)
    }
}
