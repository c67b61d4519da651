//! Order lifecycle types
//!
//! An order is created Open with funds already reserved, mutated only by
//! the matching engine (remaining decremented) or by cancellation, and is
//! immutable once Filled or Cancelled.

use crate::errors::OrderError;
use crate::ids::{AccountId, OrderId, Symbol};
use crate::numeric::{Amount, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Resting in the book, may still match
    Open,
    /// Remaining amount reached zero (terminal)
    Filled,
    /// Cancelled by the owner, reserved funds released (terminal)
    Cancelled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// A resting limit order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub symbol: Symbol,
    pub side: Side,
    pub price: Price,
    /// Unfilled amount; decremented by fills, fixed once terminal
    pub remaining: Amount,
    pub original_amount: Amount,
    /// Commission fixed at creation (cash, 2 dp)
    pub fee: Decimal,
    pub status: OrderStatus,
    /// Unix nanos; drives time priority among equal prices
    pub created_at: i64,
}

impl Order {
    /// Create a new open order
    ///
    /// The caller has already reserved the corresponding funds/assets.
    pub fn new(
        account_id: AccountId,
        symbol: Symbol,
        side: Side,
        price: Price,
        amount: Amount,
        fee: Decimal,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            account_id,
            symbol,
            side,
            price,
            remaining: amount,
            original_amount: amount,
            fee,
            status: OrderStatus::Open,
            created_at: timestamp,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// Amount filled so far
    pub fn filled_amount(&self) -> Amount {
        // remaining never exceeds original_amount
        self.original_amount
            .checked_sub(self.remaining)
            .unwrap_or_else(|_| Amount::zero())
    }

    /// Apply a fill: decrement remaining, flip to Filled at zero
    pub fn fill(&mut self, amount: Amount) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::Terminal {
                status: self.status,
            });
        }
        self.remaining =
            self.remaining
                .checked_sub(amount)
                .map_err(|_| OrderError::FillExceedsRemaining {
                    fill: amount.as_decimal(),
                    remaining: self.remaining.as_decimal(),
                })?;
        if self.remaining.is_zero() {
            self.status = OrderStatus::Filled;
        }
        Ok(())
    }

    /// Mark the order cancelled
    ///
    /// Fund release is the caller's responsibility (it knows what was
    /// reserved); terminal orders cannot be cancelled.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::Terminal {
                status: self.status,
            });
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromStr;

    fn amt(s: &str) -> Amount {
        Amount::try_new(Decimal::from_str(s).unwrap()).unwrap()
    }

    fn test_order(side: Side, price: u64, amount: &str) -> Order {
        Order::new(
            AccountId::new(),
            Symbol::Btc,
            side,
            Price::from_u64(price),
            amt(amount),
            Decimal::from(750),
            1734567890000000000,
        )
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_order_created_open() {
        let order = test_order(Side::Buy, 50000, "1.0");
        assert!(order.is_open());
        assert_eq!(order.remaining, order.original_amount);
        assert!(order.filled_amount().is_zero());
    }

    #[test]
    fn test_partial_fill_stays_open() {
        let mut order = test_order(Side::Buy, 50000, "1.0");
        order.fill(amt("0.3")).unwrap();

        assert!(order.is_open());
        assert_eq!(order.remaining, amt("0.7"));
        assert_eq!(order.filled_amount(), amt("0.3"));
    }

    #[test]
    fn test_full_fill_is_terminal() {
        let mut order = test_order(Side::Sell, 50000, "1.0");
        order.fill(amt("1.0")).unwrap();

        assert_eq!(order.status, OrderStatus::Filled);
        assert!(order.status.is_terminal());
        assert!(order.remaining.is_zero());
    }

    #[test]
    fn test_overfill_rejected() {
        let mut order = test_order(Side::Buy, 50000, "1.0");
        let err = order.fill(amt("1.5")).unwrap_err();
        assert!(matches!(err, OrderError::FillExceedsRemaining { .. }));
        // order untouched
        assert_eq!(order.remaining, amt("1.0"));
    }

    #[test]
    fn test_fill_after_terminal_rejected() {
        let mut order = test_order(Side::Buy, 50000, "1.0");
        order.fill(amt("1.0")).unwrap();
        assert!(matches!(
            order.fill(amt("0.1")),
            Err(OrderError::Terminal { .. })
        ));
    }

    #[test]
    fn test_cancel_open_order() {
        let mut order = test_order(Side::Sell, 50000, "1.0");
        order.cancel().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_terminal_rejected() {
        let mut order = test_order(Side::Sell, 50000, "1.0");
        order.fill(amt("1.0")).unwrap();
        assert!(matches!(order.cancel(), Err(OrderError::Terminal { .. })));

        let mut cancelled = test_order(Side::Sell, 50000, "1.0");
        cancelled.cancel().unwrap();
        assert!(matches!(
            cancelled.cancel(),
            Err(OrderError::Terminal { .. })
        ));
    }

    #[test]
    fn test_order_serialization() {
        let order = test_order(Side::Buy, 50000, "0.25");
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();

        assert_eq!(order, deserialized);
        assert!(json.contains("\"buy\""));
        assert!(json.contains("\"OPEN\""));
    }
}
