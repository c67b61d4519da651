//! Event payloads and the publishing sink
//!
//! The core produces events; delivery (websocket fan-out, message queue)
//! is an adapter behind [`EventSink`]. Publishing happens after commit,
//! and a failure to publish never affects the financial outcome: the
//! service logs it and continues.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use types::ids::AccountId;
use types::numeric::{Amount, Price};
use types::order::Order;

/// Events emitted by the core, one per lifecycle step or fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum ExchangeEvent {
    /// A new order was accepted and is resting (or about to match)
    OrderCreated(Order),
    /// An open order was cancelled and its reserve released
    OrderCancelled(Order),
    /// One fill executed; fired once per fill, not once per order
    OrderMatched {
        buyer_account_id: AccountId,
        seller_account_id: AccountId,
        price: Price,
        amount: Amount,
    },
}

impl ExchangeEvent {
    /// Broadcast name, stable across transports
    pub fn name(&self) -> &'static str {
        match self {
            ExchangeEvent::OrderCreated(_) => "OrderCreated",
            ExchangeEvent::OrderCancelled(_) => "OrderCancelled",
            ExchangeEvent::OrderMatched { .. } => "OrderMatched",
        }
    }
}

/// Publishing failures; logged by the caller, never fatal
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("failed to serialize event: {0}")]
    Serialize(String),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Downstream broadcast interface
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &ExchangeEvent) -> Result<(), PublishError>;
}

/// Sink that logs the serialized payload via tracing
pub struct LogSink;

impl EventSink for LogSink {
    fn publish(&self, event: &ExchangeEvent) -> Result<(), PublishError> {
        match serde_json::to_string(event) {
            Ok(payload) => {
                tracing::info!(event = event.name(), %payload, "event published");
                Ok(())
            }
            Err(err) => Err(PublishError::Serialize(err.to_string())),
        }
    }
}

/// Sink that drops everything
pub struct NoopSink;

impl EventSink for NoopSink {
    fn publish(&self, _event: &ExchangeEvent) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Sink that records events in memory for assertions
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<ExchangeEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything published so far
    pub fn snapshot(&self) -> Vec<ExchangeEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Drain and return the recorded events
    pub fn take(&self) -> Vec<ExchangeEvent> {
        std::mem::take(&mut self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: &ExchangeEvent) -> Result<(), PublishError> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }
}
