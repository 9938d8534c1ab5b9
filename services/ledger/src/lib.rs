//! Balance Ledger Service
//!
//! Holds per-user, per-asset custodial balances and the append-only
//! trading ledger, and exposes the atomic settlement primitive every
//! trade-driven balance change flows through.
//!
//! **Key invariants:**
//! - `total == available + locked` for every balance, at all times
//! - One ledger entry per balance mutation, with before/after amounts
//! - A settlement either applies all four legs or none of them

pub mod settle;
pub mod store;

pub use settle::{Ledger, SettleTrade};
pub use store::BalanceBook;
