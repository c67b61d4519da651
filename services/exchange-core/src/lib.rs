//! Exchange Core
//!
//! Continuous limit-order matching core for the spot exchange: accepts
//! resting limit orders, matches crossing orders at the resting price
//! (price-time priority), updates balances and locked funds atomically,
//! and emits trade and order lifecycle events.
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced within a symbol
//! - No funds created or destroyed; fees are the only sink
//! - Every mutation runs inside a transaction holding exclusive row locks;
//!   either all of it commits or none of it does
//! - Resting liquidity is never matched twice

pub mod config;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod lock;
pub mod service;
pub mod store;
pub mod tx;

pub use config::ExchangeConfig;
pub use engine::MatchEngine;
pub use events::{EventSink, ExchangeEvent};
pub use service::Exchange;
