//! Unique identifier types for engine entities
//!
//! All IDs use UUID v7 for time-sortable ordering, enabling efficient
//! chronological queries and audit replay.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new id with the current timestamp embedded
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Create from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for an order
    OrderId
);

uuid_id!(
    /// Unique identifier for a trade
    TradeId
);

uuid_id!(
    /// Unique identifier for a user account
    UserId
);

uuid_id!(
    /// Unique identifier for an on-chain settlement record
    SettlementId
);

uuid_id!(
    /// Unique identifier for a trading ledger entry
    EntryId
);

/// Trading pair identifier
///
/// Format: "BASE/QUOTE" (e.g., "BTC/USDT", "ETH/USDC")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairSymbol(String);

impl PairSymbol {
    /// Create a new PairSymbol from a string
    ///
    /// # Panics
    /// Panics if the format is invalid (must contain '/')
    pub fn new(symbol: impl Into<String>) -> Self {
        let s = symbol.into();
        assert!(s.contains('/'), "PairSymbol must be in BASE/QUOTE format");
        Self(s)
    }

    /// Try to create a PairSymbol, returning None if invalid
    pub fn try_new(symbol: impl Into<String>) -> Option<Self> {
        let s = symbol.into();
        if s.contains('/') {
            Some(Self(s))
        } else {
            None
        }
    }

    /// Get the symbol string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The base asset symbol (left of the '/')
    pub fn base_asset(&self) -> &str {
        self.split().0
    }

    /// The quote asset symbol (right of the '/')
    pub fn quote_asset(&self) -> &str {
        self.split().1
    }

    /// Split into base and quote assets
    pub fn split(&self) -> (&str, &str) {
        match self.0.split_once('/') {
            Some(parts) => parts,
            None => (&self.0, ""),
        }
    }
}

impl fmt::Display for PairSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PairSymbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_uniqueness() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2, "OrderIds should be unique");
    }

    #[test]
    fn test_id_serialization_roundtrip() {
        let id = TradeId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: TradeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_user_id_display() {
        let id = UserId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }

    #[test]
    fn test_pair_symbol_split() {
        let pair = PairSymbol::new("BTC/USDT");
        assert_eq!(pair.as_str(), "BTC/USDT");
        assert_eq!(pair.base_asset(), "BTC");
        assert_eq!(pair.quote_asset(), "USDT");
    }

    #[test]
    fn test_pair_symbol_try_new() {
        assert!(PairSymbol::try_new("BTC/USDT").is_some());
        assert!(PairSymbol::try_new("INVALID").is_none());
    }

    #[test]
    #[should_panic(expected = "PairSymbol must be in BASE/QUOTE format")]
    fn test_pair_symbol_invalid_format() {
        PairSymbol::new("INVALID");
    }

    #[test]
    fn test_pair_symbol_serialization() {
        let pair = PairSymbol::new("ETH/USDC");
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, "\"ETH/USDC\"");
    }
}
