//! Matching cycle
//!
//! `run_cycle` is the engine's trigger surface. Each invocation loads one
//! settings snapshot, checks the gate, then matches each pair under a
//! per-pair guard so overlapping cycles never double-match the same book.
//! Matches settle before they are recorded; a settlement failure aborts
//! the rest of that pair only. Each match commits under the store lock,
//! so a concurrent cancel lands before or after a match, never inside it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use ledger::{Ledger, SettleTrade};
use notifier::{EngineEvent, Publisher};
use settlement::SettlementCoordinator;
use thiserror::Error;
use tracing::{debug, info, warn};
use types::errors::{ConfigError, LedgerError, SettlementError};
use types::ids::{OrderId, PairSymbol};
use types::order::Order;
use types::settings::EngineSettings;
use types::time;
use types::trade::{Trade, TradingType};

use crate::book::{BookSnapshot, PairBook};
use crate::matching::executor::{self, SelfTradePolicy};
use crate::store::{OrderStore, StoreError};

/// Fatal cycle errors. Everything recoverable stays inside the cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What a cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The cycle ran; `matched` trades executed across all pairs
    Completed { matched: usize },
    /// The gate was closed; nothing was touched
    Gated {
        auto_matching_enabled: bool,
        circuit_breaker_active: bool,
    },
}

/// Static engine configuration, fixed at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard cap on matches per pair per cycle
    pub max_matches_per_pair: usize,
    pub self_trade_policy: SelfTradePolicy,
    /// Pairs that settle peer-to-peer instead of custodially
    pub onchain_pairs: HashSet<PairSymbol>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_matches_per_pair: 100,
            self_trade_policy: SelfTradePolicy::default(),
            onchain_pairs: HashSet::new(),
        }
    }
}

#[derive(Error, Debug)]
enum SettleFailure {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Onchain(#[from] SettlementError),
    #[error("pair is flagged on-chain but no settlement coordinator is attached")]
    NoCoordinator,
}

/// The matching engine.
pub struct MatchingEngine {
    store: Mutex<OrderStore>,
    /// One guard per pair; `try_lock` skips a pair already being matched
    pair_guards: Mutex<HashMap<PairSymbol, Arc<Mutex<()>>>>,
    ledger: Arc<Ledger>,
    coordinator: Option<Arc<SettlementCoordinator>>,
    settings: Arc<dyn crate::settings::SettingsProvider>,
    publisher: Arc<dyn Publisher>,
    config: EngineConfig,
}

impl MatchingEngine {
    pub fn new(
        ledger: Arc<Ledger>,
        settings: Arc<dyn crate::settings::SettingsProvider>,
        publisher: Arc<dyn Publisher>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store: Mutex::new(OrderStore::new()),
            pair_guards: Mutex::new(HashMap::new()),
            ledger,
            coordinator: None,
            settings,
            publisher,
            config,
        }
    }

    /// Attach the on-chain settlement coordinator for `onchain_pairs`.
    pub fn with_coordinator(mut self, coordinator: Arc<SettlementCoordinator>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    fn lock_store(&self) -> MutexGuard<'_, OrderStore> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn pair_guard(&self, pair: &PairSymbol) -> Arc<Mutex<()>> {
        let mut guards = match self.pair_guards.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guards.entry(pair.clone()).or_default().clone()
    }

    // ───────────────────────── Order surface ─────────────────────────

    /// Accept an order; it rests until the next cycle matches it.
    pub fn place_order(&self, order: Order) -> OrderId {
        let pair = order.pair.clone();
        let order_id = self.lock_store().place(order);
        debug!(%order_id, %pair, "order placed");
        self.publisher
            .publish(EngineEvent::OrderBookChanged { pair });
        order_id
    }

    /// Cancel an open order.
    pub fn cancel_order(&self, order_id: &OrderId) -> Result<Order, StoreError> {
        let cancelled = self.lock_store().cancel(order_id)?;
        info!(%order_id, pair = %cancelled.pair, "order cancelled");
        self.publish_order_status(&cancelled);
        self.publisher.publish(EngineEvent::OrderBookChanged {
            pair: cancelled.pair.clone(),
        });
        Ok(cancelled)
    }

    pub fn order(&self, order_id: &OrderId) -> Option<Order> {
        self.lock_store().get(order_id).cloned()
    }

    pub fn trades(&self) -> Vec<Trade> {
        self.lock_store().trades().to_vec()
    }

    /// Depth snapshot built from the pair's current open orders.
    pub fn depth(&self, pair: &PairSymbol, depth: usize) -> BookSnapshot {
        let orders = self
            .lock_store()
            .open_orders_by_pair()
            .remove(pair)
            .unwrap_or_default();
        PairBook::build(pair.clone(), orders.iter()).depth_snapshot(depth)
    }

    // ───────────────────────── Matching cycle ─────────────────────────

    /// Run one matching cycle over every pair with open orders.
    pub fn run_cycle(&self) -> Result<CycleOutcome, EngineError> {
        let settings = self.settings.load()?;
        if !settings.matching_allowed() {
            info!(
                auto_matching_enabled = settings.auto_matching_enabled,
                circuit_breaker_active = settings.circuit_breaker_active,
                "matching gated off, cycle is a no-op"
            );
            return Ok(CycleOutcome::Gated {
                auto_matching_enabled: settings.auto_matching_enabled,
                circuit_breaker_active: settings.circuit_breaker_active,
            });
        }

        let by_pair = self.lock_store().open_orders_by_pair();
        let mut total_matched = 0;
        for (pair, orders) in by_pair {
            let guard = self.pair_guard(&pair);
            let Ok(_held) = guard.try_lock() else {
                debug!(%pair, "pair busy in an overlapping cycle, skipping");
                continue;
            };
            let matched = self.match_pair(&pair, &orders, &settings);
            if matched > 0 {
                self.publisher
                    .publish(EngineEvent::OrderBookChanged { pair: pair.clone() });
            }
            total_matched += matched;
        }

        info!(matched = total_matched, "matching cycle complete");
        Ok(CycleOutcome::Completed {
            matched: total_matched,
        })
    }

    /// Match one pair's book. Returns the number of trades executed before
    /// the budget, liquidity, or a settlement failure stopped it.
    fn match_pair(
        &self,
        pair: &PairSymbol,
        orders: &[Order],
        settings: &EngineSettings,
    ) -> usize {
        let book = PairBook::build(pair.clone(), orders.iter());
        let buys = book.bids.priority_entries();
        let sells = book.asks.priority_entries();
        if buys.is_empty() || sells.is_empty() {
            return 0;
        }

        let trading_type = if self.config.onchain_pairs.contains(pair) {
            TradingType::Onchain
        } else {
            TradingType::Custodial
        };

        let mut matched = 0;
        'buys: for buy_entry in &buys {
            if matched >= self.config.max_matches_per_pair {
                break;
            }
            for sell_entry in &sells {
                if matched >= self.config.max_matches_per_pair {
                    break 'buys;
                }

                // Priority order comes from the book; remaining quantities
                // come live from the store, fills above may have consumed
                // either side already. The guard is held through settle and
                // fill so a concurrent cancel serializes with the commit.
                let now = time::now_nanos();
                let mut store = self.lock_store();
                let (buy, sell) = match (
                    store.get(&buy_entry.order_id),
                    store.get(&sell_entry.order_id),
                ) {
                    (Some(buy), Some(sell)) => (buy.clone(), sell.clone()),
                    _ => continue,
                };
                if !buy.is_open() || buy.remaining_quantity.is_zero() {
                    continue 'buys;
                }
                if !sell.is_open() || sell.remaining_quantity.is_zero() {
                    continue;
                }

                let Some(trade) = executor::plan_match(
                    &buy,
                    &sell,
                    settings,
                    self.config.self_trade_policy,
                    trading_type,
                    now,
                ) else {
                    // Asks iterate cheapest first: once a limit sell is
                    // above this buy's limit, the rest are too.
                    if let (Some(buy_price), Some(sell_price)) = (buy.price, sell.price) {
                        if buy_price < sell_price {
                            continue 'buys;
                        }
                    }
                    continue;
                };

                if let Err(failure) = self.settle(&trade) {
                    warn!(
                        %pair,
                        trade_id = %trade.trade_id,
                        error = %failure,
                        "settlement failed, aborting pair for this cycle"
                    );
                    return matched;
                }

                // Both orders were verified open under this same guard, so
                // the fills cannot miss or hit a terminal order.
                let buy_after = match store.apply_fill(&buy.order_id, trade.quantity, now) {
                    Ok(order) => order,
                    Err(err) => unreachable!("fill rejected for verified open order: {err}"),
                };
                let sell_after = match store.apply_fill(&sell.order_id, trade.quantity, now) {
                    Ok(order) => order,
                    Err(err) => unreachable!("fill rejected for verified open order: {err}"),
                };
                store.record_trade(trade.clone());
                drop(store);

                debug!(
                    %pair,
                    trade_id = %trade.trade_id,
                    quantity = %trade.quantity,
                    price = %trade.price,
                    "trade executed"
                );
                self.publisher.publish(EngineEvent::TradeExecuted {
                    trade: trade.clone(),
                });
                self.publish_order_status(&buy_after);
                self.publish_order_status(&sell_after);
                matched += 1;

                if buy_after.is_filled() {
                    continue 'buys;
                }
            }
        }
        matched
    }

    /// Settle one trade: custodial pairs move ledger balances atomically,
    /// on-chain pairs record delivery intent with the coordinator.
    fn settle(&self, trade: &Trade) -> Result<(), SettleFailure> {
        match trade.trading_type {
            TradingType::Custodial => {
                let (base_asset, quote_asset) = trade.pair.split();
                self.ledger.settle_trade(&SettleTrade {
                    buyer_id: trade.buyer_id,
                    seller_id: trade.seller_id,
                    base_asset: base_asset.to_string(),
                    quote_asset: quote_asset.to_string(),
                    quantity: trade.quantity,
                    price: trade.price,
                    buyer_fee: trade.buyer_fee,
                    seller_fee: trade.seller_fee,
                    reference_id: trade.trade_id.to_string(),
                })?;
                Ok(())
            }
            TradingType::Onchain => {
                let coordinator = self
                    .coordinator
                    .as_ref()
                    .ok_or(SettleFailure::NoCoordinator)?;
                coordinator.request_onchain_settlement(trade)?;
                Ok(())
            }
        }
    }

    fn publish_order_status(&self, order: &Order) {
        self.publisher.publish(EngineEvent::OrderStatusChanged {
            order_id: order.order_id,
            user_id: order.user_id,
            pair: order.pair.clone(),
            status: order.status,
            filled_quantity: order.filled_quantity,
            remaining_quantity: order.remaining_quantity,
        });
    }
}
