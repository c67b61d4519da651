//! Runtime configuration for the exchange core

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use types::fee;

/// Tunable parameters, deserializable from the service config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Commission rate charged on order notional at placement
    pub commission_rate: Decimal,
    /// How long a transaction waits for a row lock before aborting
    /// with `ConcurrencyConflict`
    pub lock_wait_ms: u64,
    /// Whether an account may match against its own resting orders
    pub allow_self_trade: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            commission_rate: fee::default_commission_rate(),
            lock_wait_ms: 2_000,
            allow_self_trade: true,
        }
    }
}

impl ExchangeConfig {
    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromStr;

    #[test]
    fn test_defaults() {
        let config = ExchangeConfig::default();
        assert_eq!(config.commission_rate, Decimal::from_str("0.015").unwrap());
        assert_eq!(config.lock_wait(), Duration::from_millis(2_000));
        assert!(config.allow_self_trade);
    }

    #[test]
    fn test_partial_deserialization() {
        let config: ExchangeConfig =
            serde_json::from_str(r#"{"allow_self_trade": false}"#).unwrap();
        assert!(!config.allow_self_trade);
        assert_eq!(config.lock_wait_ms, 2_000);
    }
}
