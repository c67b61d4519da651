//! Order and trade stores
//!
//! In-memory row tables. The order store answers the matchable query in
//! price-time priority; the trade store is an append-only audit log.
//! Row-level exclusive locking is the transaction's job (see `tx`); the
//! stores themselves only guarantee map-level consistency.

use dashmap::DashMap;
use std::cmp::Ordering;
use std::sync::RwLock;
use types::errors::ExchangeError;
use types::ids::{AccountId, OrderId, Symbol};
use types::numeric::Price;
use types::order::{Order, Side};
use types::trade::Trade;

/// Does a resting price cross an incoming order's limit?
fn crosses(taker_side: Side, limit: Price, resting: Price) -> bool {
    match taker_side {
        Side::Buy => resting <= limit,
        Side::Sell => resting >= limit,
    }
}

/// Price-time priority for candidates facing a taker on `taker_side`:
/// best price first (ascending for asks, descending for bids), then
/// older orders first, then ascending id as a final deterministic
/// tie-break.
fn priority(taker_side: Side, a: &Order, b: &Order) -> Ordering {
    let by_price = match taker_side {
        Side::Buy => a.price.cmp(&b.price),
        Side::Sell => b.price.cmp(&a.price),
    };
    by_price
        .then(a.created_at.cmp(&b.created_at))
        .then(a.order_id.cmp(&b.order_id))
}

/// Table of all orders, keyed by id
#[derive(Default)]
pub struct OrderStore {
    orders: DashMap<OrderId, Order>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a row (used by transaction commit)
    pub fn insert(&self, order: Order) {
        self.orders.insert(order.order_id, order);
    }

    /// Snapshot of a row by id
    pub fn get(&self, id: OrderId) -> Result<Order, ExchangeError> {
        self.orders
            .get(&id)
            .map(|row| row.clone())
            .ok_or(ExchangeError::NotFound(id))
    }

    /// Open opposite-side orders whose price crosses `limit`, in
    /// price-time priority.
    ///
    /// This is an unlocked snapshot query: callers must lock each
    /// candidate row and re-check it is still open with remaining > 0
    /// before mutating it.
    pub fn find_matchable(&self, symbol: Symbol, taker_side: Side, limit: Price) -> Vec<Order> {
        let mut candidates: Vec<Order> = self
            .orders
            .iter()
            .filter(|row| {
                row.symbol == symbol
                    && row.side == taker_side.opposite()
                    && row.is_open()
                    && !row.remaining.is_zero()
                    && crosses(taker_side, limit, row.price)
            })
            .map(|row| row.clone())
            .collect();
        candidates.sort_by(|a, b| priority(taker_side, a, b));
        candidates
    }

    /// Open orders on one side of a symbol, best price first (display
    /// ordering: bids descending, asks ascending)
    pub fn open_orders(&self, symbol: Symbol, side: Side) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|row| row.symbol == symbol && row.side == side && row.is_open())
            .map(|row| row.clone())
            .collect();
        orders.sort_by(|a, b| {
            let by_price = match side {
                Side::Buy => b.price.cmp(&a.price),
                Side::Sell => a.price.cmp(&b.price),
            };
            by_price.then(a.created_at.cmp(&b.created_at))
        });
        orders
    }

    /// An account's most recent orders, newest first
    pub fn recent_for_account(&self, account_id: AccountId, limit: usize) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|row| row.account_id == account_id)
            .map(|row| row.clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.order_id.cmp(&a.order_id)));
        orders.truncate(limit);
        orders
    }
}

/// Append-only trade log
#[derive(Default)]
pub struct TradeStore {
    trades: RwLock<Vec<Trade>>,
}

impl TradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, trade: Trade) {
        self.trades
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(trade);
    }

    pub fn all(&self) -> Vec<Trade> {
        self.trades
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn for_symbol(&self, symbol: Symbol) -> Vec<Trade> {
        self.trades
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|t| t.symbol == symbol)
            .cloned()
            .collect()
    }

    /// Fills touching one order (either side)
    pub fn for_order(&self, order_id: OrderId) -> Vec<Trade> {
        self.trades
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|t| t.buy_order_id == order_id || t.sell_order_id == order_id)
            .cloned()
            .collect()
    }
}
