//! Error taxonomy shared across the engine services
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Balance ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient balance for user {user_id} asset {asset}: required {required}, available {available}")]
    InsufficientBalance {
        user_id: String,
        asset: String,
        required: String,
        available: String,
    },

    #[error("Ledger contention: retry budget of {attempts} attempts exhausted")]
    ContentionExceeded { attempts: u32 },

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("Invalid amount: must be positive")]
    InvalidAmount,
}

/// Engine settings load failure; fatal to an entire matching cycle.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Engine settings unavailable: {reason}")]
pub struct ConfigError {
    pub reason: String,
}

impl ConfigError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Settlement coordination errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettlementError {
    #[error("No on-chain wallet for user {user_id} asset {asset}")]
    WalletNotFound { user_id: String, asset: String },

    #[error("Asset not transferable on-chain: {symbol}")]
    UnsupportedAsset { symbol: String },

    #[error("Invalid settlement amount for {asset}: must be positive")]
    InvalidAmount { asset: String },

    #[error("Settlement not found for trade {trade_id}")]
    NotFound { trade_id: String },

    #[error("No settlement request for user {user_id} on trade {trade_id}")]
    RequestNotFound { trade_id: String, user_id: String },
}
