//! Wallet and asset registries
//!
//! The coordinator resolves counterparty wallets and asset transferability
//! through these lookups. Both are in-memory maps loaded at startup.

use std::collections::{HashMap, HashSet};

use types::errors::SettlementError;
use types::ids::UserId;

/// On-chain wallet addresses, one per (user, asset).
#[derive(Debug, Default)]
pub struct WalletDirectory {
    wallets: HashMap<(UserId, String), String>,
}

impl WalletDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a user's wallet for an asset.
    pub fn register(&mut self, user_id: UserId, asset: &str, address: impl Into<String>) {
        self.wallets
            .insert((user_id, asset.to_string()), address.into());
    }

    /// Resolve a user's wallet for an asset.
    pub fn resolve(&self, user_id: &UserId, asset: &str) -> Result<&str, SettlementError> {
        self.wallets
            .get(&(*user_id, asset.to_string()))
            .map(String::as_str)
            .ok_or_else(|| SettlementError::WalletNotFound {
                user_id: user_id.to_string(),
                asset: asset.to_string(),
            })
    }
}

/// Assets eligible for on-chain transfer.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    transferable: HashSet<String>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an asset as transferable on-chain.
    pub fn add(&mut self, symbol: &str) {
        self.transferable.insert(symbol.to_string());
    }

    pub fn is_transferable(&self, symbol: &str) -> bool {
        self.transferable.contains(symbol)
    }

    /// Fail unless the asset can be transferred on-chain.
    pub fn require_transferable(&self, symbol: &str) -> Result<(), SettlementError> {
        if self.is_transferable(symbol) {
            Ok(())
        } else {
            Err(SettlementError::UnsupportedAsset {
                symbol: symbol.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_register_and_resolve() {
        let mut directory = WalletDirectory::new();
        let user = UserId::new();
        directory.register(user, "BTC", "bc1qexample");

        assert_eq!(directory.resolve(&user, "BTC").unwrap(), "bc1qexample");
        assert!(matches!(
            directory.resolve(&user, "ETH"),
            Err(SettlementError::WalletNotFound { .. })
        ));
    }

    #[test]
    fn test_register_replaces_address() {
        let mut directory = WalletDirectory::new();
        let user = UserId::new();
        directory.register(user, "BTC", "bc1qold");
        directory.register(user, "BTC", "bc1qnew");
        assert_eq!(directory.resolve(&user, "BTC").unwrap(), "bc1qnew");
    }

    #[test]
    fn test_asset_transferability() {
        let mut registry = AssetRegistry::new();
        registry.add("BTC");

        assert!(registry.require_transferable("BTC").is_ok());
        assert_eq!(
            registry.require_transferable("SHIB"),
            Err(SettlementError::UnsupportedAsset {
                symbol: "SHIB".to_string()
            })
        );
    }
}
