//! Error taxonomy for the exchange core
//!
//! Comprehensive error types using thiserror. Every error raised inside a
//! matching/settlement transaction aborts the whole transaction; the API
//! surfaces the error to its caller unchanged in kind.

use crate::ids::{AccountId, OrderId, Symbol, UnknownSymbol};
use crate::numeric::NumericError;
use crate::order::OrderStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level error surfaced by the order API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("validation failed: {0}")]
    Validation(#[from] NumericError),

    #[error("validation failed: {0}")]
    UnknownSymbol(#[from] UnknownSymbol),

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient {symbol}: required {required}, available {available}")]
    InsufficientAsset {
        symbol: Symbol,
        required: Decimal,
        available: Decimal,
    },

    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("order {0} does not belong to the caller")]
    Forbidden(OrderId),

    #[error("order {order_id} is {status:?}, expected Open")]
    InvalidState {
        order_id: OrderId,
        status: OrderStatus,
    },

    #[error("lock wait timed out on {entity}")]
    ConcurrencyConflict { entity: String },

    #[error("internal invariant violated: {message}")]
    Internal { message: String },
}

impl ExchangeError {
    /// Cancel/mutate attempted on an order that is no longer open
    pub fn invalid_state(order_id: OrderId, status: OrderStatus) -> Self {
        Self::InvalidState { order_id, status }
    }
}

/// Order lifecycle violations
///
/// These indicate a broken engine invariant rather than bad user input,
/// so they map to [`ExchangeError::Internal`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("fill of {fill} exceeds remaining {remaining}")]
    FillExceedsRemaining { fill: Decimal, remaining: Decimal },

    #[error("order is terminal ({status:?})")]
    Terminal { status: OrderStatus },
}

impl From<OrderError> for ExchangeError {
    fn from(err: OrderError) -> Self {
        ExchangeError::Internal {
            message: err.to_string(),
        }
    }
}

/// Balance/holding violations raised by ledger mutations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountError {
    #[error("insufficient cash: required {required}, available {available}")]
    InsufficientCash {
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient {symbol} available: required {required}, available {available}")]
    InsufficientAvailable {
        symbol: Symbol,
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient {symbol} locked: required {required}, locked {locked}")]
    InsufficientLocked {
        symbol: Symbol,
        required: Decimal,
        locked: Decimal,
    },
}

impl From<AccountError> for ExchangeError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InsufficientCash {
                required,
                available,
            } => ExchangeError::InsufficientFunds {
                required,
                available,
            },
            AccountError::InsufficientAvailable {
                symbol,
                required,
                available,
            } => ExchangeError::InsufficientAsset {
                symbol,
                required,
                available,
            },
            // A locked shortfall means reserves were not maintained; that is
            // an engine bug, not a user-visible insufficiency.
            AccountError::InsufficientLocked { .. } => ExchangeError::Internal {
                message: err.to_string(),
            },
        }
    }
}
