//! Types library for the spot exchange
//!
//! This library provides all core type definitions shared between the
//! exchange services, ensuring type safety and deterministic arithmetic.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, TradeId, AccountId) and `Symbol`
//! - `numeric`: Fixed-point decimal types (Price, Amount) and cash rounding
//! - `order`: Order lifecycle types
//! - `trade`: Trade records (append-only audit log)
//! - `account`: Account cash balance and per-asset holdings
//! - `fee`: Commission policy
//! - `errors`: Error taxonomy

// Public modules
pub mod account;
pub mod errors;
pub mod fee;
pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::account::*;
    pub use crate::errors::*;
    pub use crate::fee::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::trade::*;
}
