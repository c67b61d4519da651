//! Fixed-point decimal types for prices and amounts
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point
//! errors). Prices carry at most 2 fractional digits, asset amounts at
//! most 8. Settlement keeps exact products; only fees round (HALF_UP to
//! cash precision).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fractional digits of a limit price
pub const PRICE_DP: u32 = 2;

/// Fractional digits of an asset amount (satoshi precision)
pub const AMOUNT_DP: u32 = 8;

/// Fractional digits of rounded cash figures (fees, display values)
pub const CASH_DP: u32 = 2;

/// Validation errors for numeric inputs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("price must be greater than zero, got {0}")]
    NonPositivePrice(Decimal),

    #[error("price {value} exceeds {max} decimal places")]
    PriceScale { value: Decimal, max: u32 },

    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("amount {value} exceeds {max} decimal places")]
    AmountScale { value: Decimal, max: u32 },

    #[error("amount underflow: {minuend} - {subtrahend}")]
    AmountUnderflow { minuend: Decimal, subtrahend: Decimal },
}

/// Limit price: strictly positive, at most [`PRICE_DP`] fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Validate and wrap a decimal price
    pub fn try_new(value: Decimal) -> Result<Self, NumericError> {
        if value <= Decimal::ZERO {
            return Err(NumericError::NonPositivePrice(value));
        }
        if value.normalize().scale() > PRICE_DP {
            return Err(NumericError::PriceScale {
                value,
                max: PRICE_DP,
            });
        }
        Ok(Self(value))
    }

    /// Whole-dollar price, convenient in tests
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asset amount: non-negative, at most [`AMOUNT_DP`] fractional digits
///
/// Zero is representable because a fully filled order has remaining = 0;
/// order entry additionally requires a strictly positive amount
/// ([`Amount::try_positive`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Validate and wrap a non-negative decimal amount
    pub fn try_new(value: Decimal) -> Result<Self, NumericError> {
        if value < Decimal::ZERO {
            return Err(NumericError::NonPositiveAmount(value));
        }
        if value.normalize().scale() > AMOUNT_DP {
            return Err(NumericError::AmountScale {
                value,
                max: AMOUNT_DP,
            });
        }
        Ok(Self(value))
    }

    /// Validate an order-entry amount (strictly positive)
    pub fn try_positive(value: Decimal) -> Result<Self, NumericError> {
        if value <= Decimal::ZERO {
            return Err(NumericError::NonPositiveAmount(value));
        }
        Self::try_new(value)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The smaller of two amounts (fill sizing)
    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Subtract, failing on underflow rather than going negative
    pub fn checked_sub(self, other: Self) -> Result<Self, NumericError> {
        if other.0 > self.0 {
            return Err(NumericError::AmountUnderflow {
                minuend: self.0,
                subtrahend: other.0,
            });
        }
        Ok(Self(self.0 - other.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round a decimal to cash precision (2 dp, HALF_UP)
pub fn to_cash(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CASH_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Notional value of (price, amount), rounded to cash precision
pub fn notional(price: Price, amount: Amount) -> Decimal {
    to_cash(price.as_decimal() * amount.as_decimal())
}
