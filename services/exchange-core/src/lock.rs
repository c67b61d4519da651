//! Exclusive entity locks
//!
//! Stand-in for database row locks: a transaction acquires an exclusive
//! lock per entity key before reading or mutating the row, and holds it
//! until commit or rollback. Waiters block until the holder releases or
//! the configured deadline passes; a timed-out wait surfaces as
//! `ConcurrencyConflict` and aborts the enclosing transaction, which is
//! also how deadlocks are broken.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use types::errors::ExchangeError;
use types::ids::{AccountId, OrderId};

/// Lockable entity key
///
/// The `Ord` impl sorts accounts before orders and ids ascending, the
/// recommended acquisition order when a lock set is known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    Account(AccountId),
    Order(OrderId),
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKey::Account(id) => write!(f, "account {id}"),
            LockKey::Order(id) => write!(f, "order {id}"),
        }
    }
}

/// Table of currently held entity locks
pub struct LockManager {
    held: Mutex<HashSet<LockKey>>,
    released: Condvar,
    wait: Duration,
}

impl LockManager {
    pub fn new(wait: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            wait,
        }
    }

    fn table(&self) -> MutexGuard<'_, HashSet<LockKey>> {
        // A poisoned table only means another thread panicked while
        // holding the table mutex; the set itself is still consistent.
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Acquire an exclusive lock on `key`, waiting up to the configured
    /// deadline. The returned guard releases the lock on drop.
    pub fn acquire(&self, key: LockKey) -> Result<KeyGuard<'_>, ExchangeError> {
        let deadline = Instant::now() + self.wait;
        let mut held = self.table();
        while held.contains(&key) {
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(%key, "lock wait timed out");
                return Err(ExchangeError::ConcurrencyConflict {
                    entity: key.to_string(),
                });
            }
            let (guard, _timeout) = self
                .released
                .wait_timeout(held, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            held = guard;
        }
        held.insert(key);
        Ok(KeyGuard { manager: self, key })
    }
}

/// Held exclusive lock; releases and wakes waiters on drop
pub struct KeyGuard<'a> {
    manager: &'a LockManager,
    key: LockKey,
}

impl fmt::Debug for KeyGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGuard").field("key", &self.key).finish()
    }
}

impl KeyGuard<'_> {
    pub fn key(&self) -> LockKey {
        self.key
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.manager.table();
        held.remove(&self.key);
        self.manager.released.notify_all();
    }
}
