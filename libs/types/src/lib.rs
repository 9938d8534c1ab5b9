//! Types library for the matching and settlement engine
//!
//! This library provides all core type definitions shared across the engine
//! services, ensuring type safety and deterministic behavior.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, TradeId, UserId, SettlementId, PairSymbol)
//! - `numeric`: Fixed-point decimal types (Price, Quantity)
//! - `order`: Order lifecycle types
//! - `trade`: Trade execution types
//! - `balance`: Wallet balance types
//! - `ledger`: Append-only trading ledger entries
//! - `settlement`: On-chain settlement records
//! - `settings`: Engine configuration snapshot
//! - `errors`: Error taxonomy

pub mod balance;
pub mod errors;
pub mod ids;
pub mod ledger;
pub mod numeric;
pub mod order;
pub mod settings;
pub mod settlement;
pub mod trade;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Wall-clock helpers. All timestamps in the system are Unix nanoseconds.
pub mod time {
    /// Current time as Unix nanoseconds.
    pub fn now_nanos() -> i64 {
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::balance::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::ledger::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::settings::*;
    pub use crate::settlement::*;
    pub use crate::trade::*;
}
