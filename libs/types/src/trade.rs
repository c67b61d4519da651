//! Trade records
//!
//! A trade is one fill between a buy order and a sell order, recorded at
//! the resting order's price. Trades are append-only audit records; many
//! trades may reference one order (partial fills).

use crate::ids::{OrderId, Symbol, TradeId};
use crate::numeric::{notional, Amount, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One matched fill, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub symbol: Symbol,
    pub price: Price,
    pub amount: Amount,
    /// Unix nanos
    pub executed_at: i64,
}

impl Trade {
    pub fn new(
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        symbol: Symbol,
        price: Price,
        amount: Amount,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            buy_order_id,
            sell_order_id,
            symbol,
            price,
            amount,
            executed_at,
        }
    }

    /// Cash value of the fill (price × amount, 2 dp)
    pub fn value(&self) -> Decimal {
        notional(self.price, self.amount)
    }
}
