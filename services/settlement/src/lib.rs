//! Settlement Coordinator
//!
//! Orchestrates peer-to-peer delivery of on-chain trades. The coordinator
//! records what must happen (one settlement per trade, two counterparty
//! transfer requests) and tracks signatures and confirmations; it never
//! moves funds itself and never touches the custodial ledger.

pub mod coordinator;
pub mod registry;

pub use coordinator::SettlementCoordinator;
pub use registry::{AssetRegistry, WalletDirectory};
