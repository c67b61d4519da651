//! Exchange service: the public surface of the core
//!
//! Wires the ledger, stores, lock table and matching engine together and
//! exposes order submission, cancellation, deposits and the read
//! surface. Every mutating call runs as one transaction: reserve, write
//! and match commit together or the call returns an error and nothing
//! changed. Events are published only after commit.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

use serde::Serialize;
use types::account::Account;
use types::errors::ExchangeError;
use types::fee::order_commission;
use types::ids::{AccountId, OrderId, Symbol};
use types::numeric::{Amount, Price};
use types::order::{Order, Side};
use types::trade::Trade;

use crate::config::ExchangeConfig;
use crate::engine::MatchEngine;
use crate::events::{EventSink, ExchangeEvent, NoopSink};
use crate::ledger::{self, Ledger};
use crate::lock::LockManager;
use crate::store::{OrderStore, TradeStore};
use crate::tx::Transaction;

/// One side of the book in display order
#[derive(Debug, Clone, Serialize)]
pub struct OrderBook {
    pub symbol: Symbol,
    /// Bids, best (highest) price first
    pub buy_orders: Vec<Order>,
    /// Asks, best (lowest) price first
    pub sell_orders: Vec<Order>,
}

/// One asset row of an account overview
#[derive(Debug, Clone, Serialize)]
pub struct AssetPosition {
    pub symbol: Symbol,
    pub amount: Decimal,
    pub locked_amount: Decimal,
}

/// Account snapshot for display: cash, positions, latest orders
#[derive(Debug, Clone, Serialize)]
pub struct AccountOverview {
    pub account_id: AccountId,
    pub usd_balance: Decimal,
    pub assets: Vec<AssetPosition>,
    pub recent_orders: Vec<Order>,
}

const RECENT_ORDERS_LIMIT: usize = 10;

/// The exchange core: accounts, books, matching and events
pub struct Exchange {
    config: ExchangeConfig,
    ledger: Ledger,
    orders: OrderStore,
    trades: TradeStore,
    locks: LockManager,
    engine: MatchEngine,
    sink: Arc<dyn EventSink>,
}

impl Exchange {
    pub fn new(config: ExchangeConfig, sink: Arc<dyn EventSink>) -> Self {
        let locks = LockManager::new(config.lock_wait());
        let engine = MatchEngine::new(config.clone());
        Self {
            config,
            ledger: Ledger::new(),
            orders: OrderStore::new(),
            trades: TradeStore::new(),
            locks,
            engine,
            sink,
        }
    }

    /// Default configuration, events dropped
    pub fn with_defaults() -> Self {
        Self::new(ExchangeConfig::default(), Arc::new(NoopSink))
    }

    fn begin(&self) -> Transaction<'_> {
        Transaction::begin(&self.locks, &self.ledger, &self.orders, &self.trades)
    }

    fn publish(&self, events: Vec<ExchangeEvent>) {
        for event in events {
            if let Err(err) = self.sink.publish(&event) {
                tracing::warn!(event = event.name(), error = %err, "event publish failed");
            }
        }
    }

    /// Create an account with an opening cash balance
    pub fn open_account(&self, initial_balance: Decimal) -> AccountId {
        self.ledger.open_account(initial_balance)
    }

    /// Credit asset units to an account (off-exchange deposit)
    pub fn deposit_asset(
        &self,
        account_id: AccountId,
        symbol: Symbol,
        amount: Decimal,
    ) -> Result<(), ExchangeError> {
        let amount = Amount::try_positive(amount)?;
        let mut tx = self.begin();
        tx.lock_account(account_id)?
            .credit_asset(symbol, amount.as_decimal());
        tx.commit();
        Ok(())
    }

    /// Submit a limit order.
    ///
    /// Validates the inputs, reserves the funds (cash at the limit price
    /// plus commission for a buy, asset units for a sell), writes the
    /// order and matches it against the book, all in one transaction.
    /// Returns the order as committed: Open with a remainder, or Filled.
    pub fn place_order(
        &self,
        account_id: AccountId,
        symbol: Symbol,
        side: Side,
        price: Decimal,
        amount: Decimal,
    ) -> Result<Order, ExchangeError> {
        let price = Price::try_new(price)?;
        let amount = Amount::try_positive(amount)?;
        let fee = order_commission(price, amount, self.config.commission_rate);
        let now = current_nanos();

        let mut tx = self.begin();
        match side {
            Side::Buy => {
                // Exact limit-price notional plus the rounded fee; the
                // matching fills and the cancellation refund consume this
                // reserve exactly, so nothing rounds here.
                let required = price.as_decimal() * amount.as_decimal() + fee;
                ledger::reserve_cash(&mut tx, account_id, required)?;
            }
            Side::Sell => {
                ledger::reserve_asset(&mut tx, account_id, symbol, amount)?;
            }
        }

        let order = Order::new(account_id, symbol, side, price, amount, fee, now);
        let order_id = order.order_id;
        tx.insert_order(order.clone())?;
        tx.stage_event(ExchangeEvent::OrderCreated(order));

        let result = self.engine.execute(&mut tx, &self.orders, order_id, now)?;

        let events = tx.commit();
        tracing::info!(
            order = %order_id,
            account = %account_id,
            ?side,
            fills = result.trades.len(),
            "order placed"
        );
        self.publish(events);
        Ok(result.taker)
    }

    /// Cancel an open order owned by `account_id`.
    ///
    /// Releases the unfilled remainder of the reserve: a buy refunds
    /// remaining × limit price plus the commission, a sell unlocks the
    /// remaining asset units. Cancelling a terminal order fails with
    /// `InvalidState` and changes nothing, so retries are safe.
    pub fn cancel_order(
        &self,
        account_id: AccountId,
        order_id: OrderId,
    ) -> Result<Order, ExchangeError> {
        let mut tx = self.begin();
        let mut order = tx.lock_order(order_id)?.clone();

        if order.account_id != account_id {
            return Err(ExchangeError::Forbidden(order_id));
        }
        order.cancel().map_err(|_| {
            ExchangeError::invalid_state(order_id, order.status)
        })?;

        match order.side {
            Side::Buy => {
                let refund =
                    order.price.as_decimal() * order.remaining.as_decimal() + order.fee;
                ledger::release_cash(&mut tx, account_id, refund)?;
            }
            Side::Sell => {
                ledger::release_asset(&mut tx, account_id, order.symbol, order.remaining)?;
            }
        }

        tx.stage_order(order.clone());
        tx.stage_event(ExchangeEvent::OrderCancelled(order.clone()));

        let events = tx.commit();
        tracing::info!(order = %order_id, account = %account_id, "order cancelled");
        self.publish(events);
        Ok(order)
    }

    /// Open orders of a symbol, both sides, display ordering
    pub fn order_book(&self, symbol: Symbol) -> OrderBook {
        OrderBook {
            symbol,
            buy_orders: self.orders.open_orders(symbol, Side::Buy),
            sell_orders: self.orders.open_orders(symbol, Side::Sell),
        }
    }

    /// Account snapshot: cash balance, asset positions, latest orders
    pub fn account_overview(&self, account_id: AccountId) -> Result<AccountOverview, ExchangeError> {
        let account = self.ledger.get(account_id)?;
        let mut assets: Vec<AssetPosition> = Symbol::ALL
            .iter()
            .filter_map(|&symbol| {
                account.holding(symbol).map(|h| AssetPosition {
                    symbol,
                    amount: h.available,
                    locked_amount: h.locked,
                })
            })
            .collect();
        assets.retain(|p| p.amount != Decimal::ZERO || p.locked_amount != Decimal::ZERO);
        Ok(AccountOverview {
            account_id,
            usd_balance: account.balance,
            assets,
            recent_orders: self
                .orders
                .recent_for_account(account_id, RECENT_ORDERS_LIMIT),
        })
    }

    pub fn order(&self, order_id: OrderId) -> Result<Order, ExchangeError> {
        self.orders.get(order_id)
    }

    pub fn account(&self, account_id: AccountId) -> Result<Account, ExchangeError> {
        self.ledger.get(account_id)
    }

    /// Trade history of a symbol
    pub fn trades_for(&self, symbol: Symbol) -> Vec<Trade> {
        self.trades.for_symbol(symbol)
    }

    /// Fills touching one order
    pub fn fills_for_order(&self, order_id: OrderId) -> Vec<Trade> {
        self.trades.for_order(order_id)
    }

    /// Sum of all cash balances (conservation checks)
    pub fn total_cash(&self) -> Decimal {
        self.ledger.total_cash()
    }

    /// Total units of an asset across all accounts
    pub fn total_asset(&self, symbol: Symbol) -> Decimal {
        self.ledger.total_asset(symbol)
    }
}

fn current_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}
