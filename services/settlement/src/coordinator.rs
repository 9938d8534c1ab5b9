//! Settlement coordination
//!
//! One settlement per trade, created idempotently from the trade record.
//! Each settlement carries two counterparty transfer requests that move
//! through Pending -> Signed -> Confirmed independently; the settlement
//! completes when both confirm and fails when either transfer fails.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use notifier::{EngineEvent, Publisher};
use tracing::{debug, info, warn};
use types::errors::SettlementError;
use types::ids::{SettlementId, TradeId, UserId};
use types::settlement::{
    Direction, RequestStatus, Settlement, SettlementRequest, SettlementStatus,
};
use types::time;
use types::trade::Trade;

use crate::registry::{AssetRegistry, WalletDirectory};

#[derive(Debug, Default)]
struct CoordinatorState {
    /// One settlement per trade, keyed by trade id
    settlements: HashMap<TradeId, Settlement>,
    /// Exactly two requests per settlement
    requests: HashMap<TradeId, Vec<SettlementRequest>>,
}

/// Tracks on-chain settlements and their counterparty transfer requests.
pub struct SettlementCoordinator {
    state: Mutex<CoordinatorState>,
    wallets: WalletDirectory,
    assets: AssetRegistry,
    publisher: Arc<dyn Publisher>,
}

impl SettlementCoordinator {
    pub fn new(
        wallets: WalletDirectory,
        assets: AssetRegistry,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            state: Mutex::new(CoordinatorState::default()),
            wallets,
            assets,
            publisher,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Create (or return the existing) settlement for a trade.
    ///
    /// Idempotent on trade id: a repeated call returns the stored settlement
    /// without creating duplicate transfer requests. A previously failed
    /// settlement is retried in place, bumping its retry count on each
    /// further failure.
    pub fn request_onchain_settlement(
        &self,
        trade: &Trade,
    ) -> Result<Settlement, SettlementError> {
        let mut state = self.lock_state();

        if let Some(existing) = state.settlements.get(&trade.trade_id) {
            if existing.status != SettlementStatus::Failed {
                debug!(trade_id = %trade.trade_id, "settlement already exists");
                return Ok(existing.clone());
            }
            // Failed rows are retried below on the same settlement id.
        }

        let (base_asset, quote_asset) = trade.pair.split();
        let base_amount = trade.quantity.as_decimal();
        let quote_amount = trade.total_value;
        if base_amount <= rust_decimal::Decimal::ZERO {
            return Err(SettlementError::InvalidAmount {
                asset: base_asset.to_string(),
            });
        }
        if quote_amount <= rust_decimal::Decimal::ZERO {
            return Err(SettlementError::InvalidAmount {
                asset: quote_asset.to_string(),
            });
        }
        self.assets.require_transferable(base_asset)?;
        self.assets.require_transferable(quote_asset)?;

        // Receiving wallets are part of the settlement row itself, so a
        // missing one fails the call before anything is recorded.
        let buyer_wallet = self.wallets.resolve(&trade.buyer_id, base_asset)?.to_string();
        let seller_wallet = self
            .wallets
            .resolve(&trade.seller_id, quote_asset)?
            .to_string();

        let settlement_id = state
            .settlements
            .get(&trade.trade_id)
            .map(|s| s.settlement_id)
            .unwrap_or_else(SettlementId::new);
        let retry_count = state
            .settlements
            .get(&trade.trade_id)
            .map(|s| s.retry_count)
            .unwrap_or(0);
        let mut settlement = Settlement {
            settlement_id,
            trade_id: trade.trade_id,
            buyer_id: trade.buyer_id,
            seller_id: trade.seller_id,
            symbol: trade.pair.clone(),
            base_asset: base_asset.to_string(),
            quote_asset: quote_asset.to_string(),
            base_amount,
            quote_amount,
            buyer_wallet: buyer_wallet.clone(),
            seller_wallet: seller_wallet.clone(),
            status: SettlementStatus::PendingUserAction,
            error_message: None,
            retry_count,
            created_at: time::now_nanos(),
        };

        // The row exists from here on; a request-creation failure is
        // recorded on it rather than erased.
        match self.build_requests(trade, &buyer_wallet, &seller_wallet) {
            Ok(requests) => {
                state.requests.insert(trade.trade_id, requests);
                state
                    .settlements
                    .insert(trade.trade_id, settlement.clone());
            }
            Err(err) => {
                warn!(trade_id = %trade.trade_id, error = %err, "settlement request creation failed");
                settlement.mark_failed(err.to_string());
                state
                    .settlements
                    .insert(trade.trade_id, settlement.clone());
                return Err(err);
            }
        }
        drop(state);

        info!(
            trade_id = %trade.trade_id,
            settlement_id = %settlement.settlement_id,
            "on-chain settlement created"
        );
        self.publisher.publish(EngineEvent::SettlementCreated {
            user_id: trade.buyer_id,
            settlement: settlement.clone(),
        });
        self.publisher.publish(EngineEvent::SettlementCreated {
            user_id: trade.seller_id,
            settlement: settlement.clone(),
        });
        Ok(settlement)
    }

    /// The two transfer requests: the seller sends base to the buyer, the
    /// buyer sends quote to the seller.
    fn build_requests(
        &self,
        trade: &Trade,
        buyer_wallet: &str,
        seller_wallet: &str,
    ) -> Result<Vec<SettlementRequest>, SettlementError> {
        let (base_asset, quote_asset) = trade.pair.split();
        let seller_base_wallet = self.wallets.resolve(&trade.seller_id, base_asset)?;
        let buyer_quote_wallet = self.wallets.resolve(&trade.buyer_id, quote_asset)?;

        Ok(vec![
            SettlementRequest {
                trade_id: trade.trade_id,
                user_id: trade.seller_id,
                counterparty_id: trade.buyer_id,
                direction: Direction::Send,
                asset_symbol: base_asset.to_string(),
                amount: trade.quantity.as_decimal(),
                from_wallet: seller_base_wallet.to_string(),
                to_wallet: buyer_wallet.to_string(),
                status: RequestStatus::Pending,
            },
            SettlementRequest {
                trade_id: trade.trade_id,
                user_id: trade.buyer_id,
                counterparty_id: trade.seller_id,
                direction: Direction::Send,
                asset_symbol: quote_asset.to_string(),
                amount: trade.total_value,
                from_wallet: buyer_quote_wallet.to_string(),
                to_wallet: seller_wallet.to_string(),
                status: RequestStatus::Pending,
            },
        ])
    }

    /// Record that a user signed their transfer.
    pub fn record_signature(
        &self,
        trade_id: &TradeId,
        user_id: &UserId,
    ) -> Result<SettlementRequest, SettlementError> {
        let mut state = self.lock_state();
        let request = find_request(&mut state, trade_id, user_id)?;
        if request.status == RequestStatus::Pending {
            request.status = RequestStatus::Signed;
        }
        debug!(%trade_id, %user_id, "transfer signed");
        Ok(request.clone())
    }

    /// Record an on-chain confirmation of a user's transfer. When both
    /// transfers are confirmed the settlement completes.
    pub fn confirm_transfer(
        &self,
        trade_id: &TradeId,
        user_id: &UserId,
    ) -> Result<Settlement, SettlementError> {
        let mut state = self.lock_state();
        let request = find_request(&mut state, trade_id, user_id)?;
        request.status = RequestStatus::Confirmed;

        let all_confirmed = state
            .requests
            .get(trade_id)
            .map(|reqs| reqs.iter().all(|r| r.status == RequestStatus::Confirmed))
            .unwrap_or(false);

        let settlement = state
            .settlements
            .get_mut(trade_id)
            .ok_or_else(|| SettlementError::NotFound {
                trade_id: trade_id.to_string(),
            })?;
        if all_confirmed {
            settlement.mark_completed();
            info!(%trade_id, "settlement completed");
        }
        Ok(settlement.clone())
    }

    /// Record a failed transfer; the settlement fails with it.
    pub fn fail_transfer(
        &self,
        trade_id: &TradeId,
        user_id: &UserId,
        reason: &str,
    ) -> Result<Settlement, SettlementError> {
        let mut state = self.lock_state();
        let request = find_request(&mut state, trade_id, user_id)?;
        request.status = RequestStatus::Failed;

        let settlement = state
            .settlements
            .get_mut(trade_id)
            .ok_or_else(|| SettlementError::NotFound {
                trade_id: trade_id.to_string(),
            })?;
        settlement.mark_failed(reason);
        warn!(%trade_id, %user_id, reason, "transfer failed");
        Ok(settlement.clone())
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn settlement_for_trade(&self, trade_id: &TradeId) -> Option<Settlement> {
        self.lock_state().settlements.get(trade_id).cloned()
    }

    pub fn requests_for_trade(&self, trade_id: &TradeId) -> Vec<SettlementRequest> {
        self.lock_state()
            .requests
            .get(trade_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Non-terminal requests awaiting action from one user.
    pub fn pending_requests_for_user(&self, user_id: &UserId) -> Vec<SettlementRequest> {
        self.lock_state()
            .requests
            .values()
            .flatten()
            .filter(|r| r.user_id == *user_id && !r.is_terminal())
            .cloned()
            .collect()
    }
}

fn find_request<'a>(
    state: &'a mut CoordinatorState,
    trade_id: &TradeId,
    user_id: &UserId,
) -> Result<&'a mut SettlementRequest, SettlementError> {
    if !state.settlements.contains_key(trade_id) {
        return Err(SettlementError::NotFound {
            trade_id: trade_id.to_string(),
        });
    }
    state
        .requests
        .get_mut(trade_id)
        .and_then(|reqs| reqs.iter_mut().find(|r| r.user_id == *user_id))
        .ok_or_else(|| SettlementError::RequestNotFound {
            trade_id: trade_id.to_string(),
            user_id: user_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifier::{InMemoryBus, Topic};
    use rust_decimal::Decimal;
    use types::ids::{OrderId, PairSymbol};
    use types::numeric::{Price, Quantity};
    use types::trade::TradingType;

    fn onchain_trade(buyer: UserId, seller: UserId) -> Trade {
        Trade::new(
            PairSymbol::new("BTC/USDT"),
            OrderId::new(),
            OrderId::new(),
            buyer,
            seller,
            Quantity::from_u64(2),
            Price::from_u64(50_000),
            Decimal::ZERO,
            Decimal::ZERO,
            TradingType::Onchain,
            1708123456789000000,
        )
    }

    fn full_setup(buyer: UserId, seller: UserId) -> SettlementCoordinator {
        let mut wallets = WalletDirectory::new();
        wallets.register(buyer, "BTC", "bc1qbuyer-btc");
        wallets.register(buyer, "USDT", "0xbuyer-usdt");
        wallets.register(seller, "BTC", "bc1qseller-btc");
        wallets.register(seller, "USDT", "0xseller-usdt");
        let mut assets = AssetRegistry::new();
        assets.add("BTC");
        assets.add("USDT");
        SettlementCoordinator::new(wallets, assets, Arc::new(notifier::NullPublisher))
    }

    #[test]
    fn test_settlement_creation() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let coordinator = full_setup(buyer, seller);
        let trade = onchain_trade(buyer, seller);

        let settlement = coordinator.request_onchain_settlement(&trade).unwrap();
        assert_eq!(settlement.status, SettlementStatus::PendingUserAction);
        assert_eq!(settlement.base_amount, Decimal::from(2));
        assert_eq!(settlement.quote_amount, Decimal::from(100_000));
        assert_eq!(settlement.buyer_wallet, "bc1qbuyer-btc");
        assert_eq!(settlement.seller_wallet, "0xseller-usdt");

        let requests = coordinator.requests_for_trade(&trade.trade_id);
        assert_eq!(requests.len(), 2);
        let seller_req = requests.iter().find(|r| r.user_id == seller).unwrap();
        assert_eq!(seller_req.asset_symbol, "BTC");
        assert_eq!(seller_req.amount, Decimal::from(2));
        assert_eq!(seller_req.to_wallet, "bc1qbuyer-btc");
        let buyer_req = requests.iter().find(|r| r.user_id == buyer).unwrap();
        assert_eq!(buyer_req.asset_symbol, "USDT");
        assert_eq!(buyer_req.amount, Decimal::from(100_000));
        assert_eq!(buyer_req.to_wallet, "0xseller-usdt");
    }

    #[test]
    fn test_creation_is_idempotent() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let coordinator = full_setup(buyer, seller);
        let trade = onchain_trade(buyer, seller);

        let first = coordinator.request_onchain_settlement(&trade).unwrap();
        let second = coordinator.request_onchain_settlement(&trade).unwrap();
        assert_eq!(first.settlement_id, second.settlement_id);
        assert_eq!(coordinator.requests_for_trade(&trade.trade_id).len(), 2);
    }

    #[test]
    fn test_unsupported_asset_records_nothing() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let mut wallets = WalletDirectory::new();
        wallets.register(buyer, "BTC", "w1");
        let mut assets = AssetRegistry::new();
        assets.add("BTC"); // USDT missing
        let coordinator =
            SettlementCoordinator::new(wallets, assets, Arc::new(notifier::NullPublisher));
        let trade = onchain_trade(buyer, seller);

        let result = coordinator.request_onchain_settlement(&trade);
        assert!(matches!(
            result,
            Err(SettlementError::UnsupportedAsset { .. })
        ));
        assert!(coordinator.settlement_for_trade(&trade.trade_id).is_none());
    }

    #[test]
    fn test_missing_sender_wallet_marks_row_failed() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let mut wallets = WalletDirectory::new();
        // Receiving wallets exist, the seller's base wallet does not.
        wallets.register(buyer, "BTC", "bc1qbuyer-btc");
        wallets.register(buyer, "USDT", "0xbuyer-usdt");
        wallets.register(seller, "USDT", "0xseller-usdt");
        let mut assets = AssetRegistry::new();
        assets.add("BTC");
        assets.add("USDT");
        let coordinator =
            SettlementCoordinator::new(wallets, assets, Arc::new(notifier::NullPublisher));
        let trade = onchain_trade(buyer, seller);

        let result = coordinator.request_onchain_settlement(&trade);
        assert!(matches!(result, Err(SettlementError::WalletNotFound { .. })));

        // The row survives for audit, marked failed with one retry recorded.
        let settlement = coordinator.settlement_for_trade(&trade.trade_id).unwrap();
        assert_eq!(settlement.status, SettlementStatus::Failed);
        assert_eq!(settlement.retry_count, 1);
        assert!(settlement.error_message.is_some());
        assert!(coordinator.requests_for_trade(&trade.trade_id).is_empty());
    }

    #[test]
    fn test_signature_and_confirmation_lifecycle() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let coordinator = full_setup(buyer, seller);
        let trade = onchain_trade(buyer, seller);
        coordinator.request_onchain_settlement(&trade).unwrap();

        let req = coordinator
            .record_signature(&trade.trade_id, &seller)
            .unwrap();
        assert_eq!(req.status, RequestStatus::Signed);

        let settlement = coordinator
            .confirm_transfer(&trade.trade_id, &seller)
            .unwrap();
        assert_eq!(settlement.status, SettlementStatus::PendingUserAction);

        coordinator
            .record_signature(&trade.trade_id, &buyer)
            .unwrap();
        let settlement = coordinator
            .confirm_transfer(&trade.trade_id, &buyer)
            .unwrap();
        assert_eq!(settlement.status, SettlementStatus::Completed);
        assert!(coordinator.pending_requests_for_user(&buyer).is_empty());
    }

    #[test]
    fn test_failed_transfer_fails_settlement() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let coordinator = full_setup(buyer, seller);
        let trade = onchain_trade(buyer, seller);
        coordinator.request_onchain_settlement(&trade).unwrap();

        let settlement = coordinator
            .fail_transfer(&trade.trade_id, &buyer, "broadcast rejected")
            .unwrap();
        assert_eq!(settlement.status, SettlementStatus::Failed);
        assert_eq!(
            settlement.error_message.as_deref(),
            Some("broadcast rejected")
        );
    }

    #[test]
    fn test_unknown_trade_and_user_errors() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let coordinator = full_setup(buyer, seller);
        let trade = onchain_trade(buyer, seller);

        assert!(matches!(
            coordinator.record_signature(&trade.trade_id, &buyer),
            Err(SettlementError::NotFound { .. })
        ));

        coordinator.request_onchain_settlement(&trade).unwrap();
        let stranger = UserId::new();
        assert!(matches!(
            coordinator.confirm_transfer(&trade.trade_id, &stranger),
            Err(SettlementError::RequestNotFound { .. })
        ));
    }

    #[test]
    fn test_events_published_to_both_users() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let mut wallets = WalletDirectory::new();
        wallets.register(buyer, "BTC", "w1");
        wallets.register(buyer, "USDT", "w2");
        wallets.register(seller, "BTC", "w3");
        wallets.register(seller, "USDT", "w4");
        let mut assets = AssetRegistry::new();
        assets.add("BTC");
        assets.add("USDT");

        let bus = Arc::new(InMemoryBus::new());
        let mut buyer_rx = bus.subscribe(&Topic::settlements(&buyer));
        let mut seller_rx = bus.subscribe(&Topic::settlements(&seller));
        let coordinator = SettlementCoordinator::new(wallets, assets, bus.clone());

        let trade = onchain_trade(buyer, seller);
        coordinator.request_onchain_settlement(&trade).unwrap();

        assert!(matches!(
            buyer_rx.try_recv(),
            Ok(EngineEvent::SettlementCreated { .. })
        ));
        assert!(matches!(
            seller_rx.try_recv(),
            Ok(EngineEvent::SettlementCreated { .. })
        ));
    }
}
