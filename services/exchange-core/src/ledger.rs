//! Ledger: account table and balance-moving operations
//!
//! The ledger never locks internally; every operation here takes the
//! enclosing [`Transaction`](crate::tx::Transaction), which owns the
//! exclusive row locks and the staged working copies. A failed operation
//! aborts the whole transaction, so partial application never survives.

use dashmap::DashMap;
use rust_decimal::Decimal;
use types::account::Account;
use types::errors::ExchangeError;
use types::ids::{AccountId, Symbol};
use types::numeric::{Amount, Price};

use crate::tx::Transaction;

/// Table of all accounts, keyed by id
#[derive(Default)]
pub struct Ledger {
    accounts: DashMap<AccountId, Account>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account with an opening cash balance
    pub fn open_account(&self, initial_balance: Decimal) -> AccountId {
        let account = Account::new(initial_balance);
        let id = account.account_id;
        self.accounts.insert(id, account);
        id
    }

    /// Snapshot of an account row
    pub fn get(&self, id: AccountId) -> Result<Account, ExchangeError> {
        self.accounts
            .get(&id)
            .map(|row| row.clone())
            .ok_or(ExchangeError::AccountNotFound(id))
    }

    /// Insert or overwrite a row (used by transaction commit)
    pub fn insert(&self, account: Account) {
        self.accounts.insert(account.account_id, account);
    }

    /// Sum of all cash balances (conservation checks)
    pub fn total_cash(&self) -> Decimal {
        self.accounts.iter().map(|row| row.balance).sum()
    }

    /// Sum of available + locked units of one asset across all accounts
    pub fn total_asset(&self, symbol: Symbol) -> Decimal {
        self.accounts
            .iter()
            .filter_map(|row| row.holding(symbol).map(|h| h.total()))
            .sum()
    }
}

/// Debit cash from an account (buy-order reservation).
/// Fails with `InsufficientFunds` when the balance is short.
pub fn reserve_cash(
    tx: &mut Transaction<'_>,
    account_id: AccountId,
    amount: Decimal,
) -> Result<(), ExchangeError> {
    let account = tx.lock_account(account_id)?;
    account.debit_cash(amount)?;
    Ok(())
}

/// Credit cash back to an account (cancellation, price improvement)
pub fn release_cash(
    tx: &mut Transaction<'_>,
    account_id: AccountId,
    amount: Decimal,
) -> Result<(), ExchangeError> {
    let account = tx.lock_account(account_id)?;
    account.credit_cash(amount);
    Ok(())
}

/// Move asset units available → locked (sell-order reservation).
/// Fails with `InsufficientAsset` when available is short.
pub fn reserve_asset(
    tx: &mut Transaction<'_>,
    account_id: AccountId,
    symbol: Symbol,
    amount: Amount,
) -> Result<(), ExchangeError> {
    let account = tx.lock_account(account_id)?;
    account.lock_asset(symbol, amount.as_decimal())?;
    Ok(())
}

/// Move asset units locked → available (cancellation release)
pub fn release_asset(
    tx: &mut Transaction<'_>,
    account_id: AccountId,
    symbol: Symbol,
    amount: Amount,
) -> Result<(), ExchangeError> {
    let account = tx.lock_account(account_id)?;
    account.unlock_asset(symbol, amount.as_decimal())?;
    Ok(())
}

/// Settle one fill: seller receives amount × price in cash and gives up
/// the locked asset units; buyer receives the units as available.
///
/// The cash leg is the exact decimal product, never rounded: sub-cent
/// fill values must cancel out against the buyer's exact reserve or a
/// sequence of small fills would mint cash. Rounding is reserved for
/// fees. The buyer's cash was already debited when the buy order
/// reserved funds, so no cash leaves the buyer here. All mutations are
/// staged in the transaction; they commit together or not at all.
pub fn settle_fill(
    tx: &mut Transaction<'_>,
    buyer: AccountId,
    seller: AccountId,
    symbol: Symbol,
    amount: Amount,
    price: Price,
) -> Result<(), ExchangeError> {
    let value = price.as_decimal() * amount.as_decimal();
    {
        let seller_account = tx.lock_account(seller)?;
        seller_account.credit_cash(value);
        seller_account.debit_locked(symbol, amount.as_decimal())?;
    }
    let buyer_account = tx.lock_account(buyer)?;
    buyer_account.credit_asset(symbol, amount.as_decimal());
    Ok(())
}
