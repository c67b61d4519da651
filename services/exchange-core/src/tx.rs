//! All-or-nothing transactions over the stores
//!
//! A transaction locks rows exclusively through the [`LockManager`] and
//! works on staged copies. `commit` writes every staged row back while
//! the locks are still held, then releases them; dropping an uncommitted
//! transaction discards all staged state and releases the locks, which
//! is the rollback path. Events are staged alongside the rows and handed
//! to the caller only on commit, so nothing is published for a rolled
//! back transaction.

use std::collections::HashMap;
use types::account::Account;
use types::errors::ExchangeError;
use types::ids::{AccountId, OrderId};
use types::order::Order;
use types::trade::Trade;

use crate::events::ExchangeEvent;
use crate::ledger::Ledger;
use crate::lock::{KeyGuard, LockKey, LockManager};
use crate::store::{OrderStore, TradeStore};

/// One unit of atomicity: staged rows, trades and events plus the row
/// locks protecting them
pub struct Transaction<'a> {
    locks: &'a LockManager,
    ledger: &'a Ledger,
    order_store: &'a OrderStore,
    trade_store: &'a TradeStore,
    guards: HashMap<LockKey, KeyGuard<'a>>,
    orders: HashMap<OrderId, Order>,
    accounts: HashMap<AccountId, Account>,
    trades: Vec<Trade>,
    events: Vec<ExchangeEvent>,
}

impl<'a> Transaction<'a> {
    pub fn begin(
        locks: &'a LockManager,
        ledger: &'a Ledger,
        order_store: &'a OrderStore,
        trade_store: &'a TradeStore,
    ) -> Self {
        Self {
            locks,
            ledger,
            order_store,
            trade_store,
            guards: HashMap::new(),
            orders: HashMap::new(),
            accounts: HashMap::new(),
            trades: Vec::new(),
            events: Vec::new(),
        }
    }

    fn ensure_lock(&mut self, key: LockKey) -> Result<(), ExchangeError> {
        if !self.guards.contains_key(&key) {
            let guard = self.locks.acquire(key)?;
            self.guards.insert(key, guard);
        }
        Ok(())
    }

    /// Lock an order row exclusively and return the staged working copy.
    ///
    /// The row is fetched from the store once, after the lock is held, so
    /// the copy reflects the latest committed state; repeated calls
    /// return the same staged copy.
    pub fn lock_order(&mut self, id: OrderId) -> Result<&mut Order, ExchangeError> {
        self.ensure_lock(LockKey::Order(id))?;
        if !self.orders.contains_key(&id) {
            let order = self.order_store.get(id)?;
            self.orders.insert(id, order);
        }
        self.orders.get_mut(&id).ok_or(ExchangeError::NotFound(id))
    }

    /// Lock an account row exclusively and return the staged working copy
    pub fn lock_account(&mut self, id: AccountId) -> Result<&mut Account, ExchangeError> {
        self.ensure_lock(LockKey::Account(id))?;
        if !self.accounts.contains_key(&id) {
            let account = self.ledger.get(id)?;
            self.accounts.insert(id, account);
        }
        self.accounts
            .get_mut(&id)
            .ok_or(ExchangeError::AccountNotFound(id))
    }

    /// Stage a brand-new order, locking its id
    ///
    /// The id is freshly generated so the lock is uncontended, but taking
    /// it keeps the discipline uniform: every staged row is locked.
    pub fn insert_order(&mut self, order: Order) -> Result<(), ExchangeError> {
        self.ensure_lock(LockKey::Order(order.order_id))?;
        self.orders.insert(order.order_id, order);
        Ok(())
    }

    /// Overwrite the staged copy of an already-locked order
    pub fn stage_order(&mut self, order: Order) {
        debug_assert!(
            self.guards.contains_key(&LockKey::Order(order.order_id)),
            "staging an order whose lock is not held"
        );
        self.orders.insert(order.order_id, order);
    }

    /// Stage an immutable trade record
    pub fn stage_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    /// Stage an event for post-commit publication
    pub fn stage_event(&mut self, event: ExchangeEvent) {
        self.events.push(event);
    }

    /// Write every staged row back to the stores and release the locks.
    /// Returns the staged events for the caller to publish.
    pub fn commit(mut self) -> Vec<ExchangeEvent> {
        for (_, account) in self.accounts.drain() {
            self.ledger.insert(account);
        }
        for (_, order) in self.orders.drain() {
            self.order_store.insert(order);
        }
        for trade in self.trades.drain(..) {
            self.trade_store.record(trade);
        }
        std::mem::take(&mut self.events)
        // guards drop with self, after the write-back
    }
}
