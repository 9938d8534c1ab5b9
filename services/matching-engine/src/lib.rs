//! Matching Engine
//!
//! Cycle-driven price-time priority matching. Each externally triggered
//! cycle snapshots the engine settings, groups open orders by pair, walks
//! both sides of each pair's book in priority order, and settles every
//! match atomically before recording it. Matching halts per pair on the
//! first settlement failure; a settings load failure halts the cycle.

pub mod book;
pub mod cycle;
pub mod matching;
pub mod settings;
pub mod store;

pub use cycle::{CycleOutcome, EngineConfig, EngineError, MatchingEngine};
pub use matching::executor::SelfTradePolicy;
pub use settings::{SettingsProvider, StaticSettings};
pub use store::{OrderStore, StoreError};
