//! Account cash balance and per-asset holdings
//!
//! Invariants at every committed state: cash balance ≥ 0, and for each
//! holding available ≥ 0 and locked ≥ 0. The `locked` amount of a symbol
//! equals the funds reserved by that account's open sell orders.
//!
//! Mutations return errors instead of clamping; callers run them inside a
//! transaction that owns exclusive locks on the account row, so a failed
//! mutation aborts the whole transaction.

use crate::errors::AccountError;
use crate::ids::{AccountId, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-symbol asset balance split into available and locked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHolding {
    pub available: Decimal,
    pub locked: Decimal,
}

impl AssetHolding {
    /// Total units held (available + locked)
    pub fn total(&self) -> Decimal {
        self.available + self.locked
    }

    /// Check holding invariant: both components non-negative
    pub fn check_invariant(&self) -> bool {
        self.available >= Decimal::ZERO && self.locked >= Decimal::ZERO
    }
}

/// A trading account: cash balance plus asset holdings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    /// Cash (USD) balance; exact decimal, so sub-cent fill values and
    /// reserves net out without rounding
    pub balance: Decimal,
    pub holdings: HashMap<Symbol, AssetHolding>,
}

impl Account {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            account_id: AccountId::new(),
            balance: initial_balance,
            holdings: HashMap::new(),
        }
    }

    pub fn holding(&self, symbol: Symbol) -> Option<&AssetHolding> {
        self.holdings.get(&symbol)
    }

    fn holding_mut(&mut self, symbol: Symbol) -> &mut AssetHolding {
        self.holdings.entry(symbol).or_default()
    }

    /// Debit cash, failing when the balance would go negative
    pub fn debit_cash(&mut self, amount: Decimal) -> Result<(), AccountError> {
        if self.balance < amount {
            return Err(AccountError::InsufficientCash {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    pub fn credit_cash(&mut self, amount: Decimal) {
        self.balance += amount;
    }

    /// Move asset units available → locked (sell-order reservation)
    pub fn lock_asset(&mut self, symbol: Symbol, amount: Decimal) -> Result<(), AccountError> {
        let holding = self.holding_mut(symbol);
        if holding.available < amount {
            return Err(AccountError::InsufficientAvailable {
                symbol,
                required: amount,
                available: holding.available,
            });
        }
        holding.available -= amount;
        holding.locked += amount;
        Ok(())
    }

    /// Move asset units locked → available (cancellation release)
    pub fn unlock_asset(&mut self, symbol: Symbol, amount: Decimal) -> Result<(), AccountError> {
        let holding = self.holding_mut(symbol);
        if holding.locked < amount {
            return Err(AccountError::InsufficientLocked {
                symbol,
                required: amount,
                locked: holding.locked,
            });
        }
        holding.locked -= amount;
        holding.available += amount;
        Ok(())
    }

    /// Remove asset units from locked (seller side of a settlement)
    pub fn debit_locked(&mut self, symbol: Symbol, amount: Decimal) -> Result<(), AccountError> {
        let holding = self.holding_mut(symbol);
        if holding.locked < amount {
            return Err(AccountError::InsufficientLocked {
                symbol,
                required: amount,
                locked: holding.locked,
            });
        }
        holding.locked -= amount;
        Ok(())
    }

    /// Add asset units to available (buyer side of a settlement, deposits)
    pub fn credit_asset(&mut self, symbol: Symbol, amount: Decimal) {
        self.holding_mut(symbol).available += amount;
    }

    /// Check account invariants: cash ≥ 0, all holdings non-negative
    pub fn check_invariant(&self) -> bool {
        self.balance >= Decimal::ZERO && self.holdings.values().all(|h| h.check_invariant())
    }
}
