//! Commission policy
//!
//! A flat 1.5% commission on notional value, fixed at order creation and
//! rounded to cash precision. Buyers reserve it with their principal;
//! fees are a one-way sink, never refunded on a filled order.

use crate::numeric::{notional, to_cash, Amount, Price};
use rust_decimal::Decimal;

/// Default commission rate (1.5%)
pub fn default_commission_rate() -> Decimal {
    Decimal::new(15, 3)
}

/// Commission on a notional value at the given rate, 2 dp HALF_UP
pub fn commission(notional_value: Decimal, rate: Decimal) -> Decimal {
    to_cash(notional_value * rate)
}

/// Commission for an order (price × amount × rate)
pub fn order_commission(price: Price, amount: Amount, rate: Decimal) -> Decimal {
    commission(notional(price, amount), rate)
}
