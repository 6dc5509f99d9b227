use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use log::trace;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>;

/// A set of per-account mutexes.
///
/// Holding the guard returned by [`AccountLocks::lock`] gives the caller exclusive access to that account within this
/// process. Different accounts never contend with each other. Entries are removed again once nobody holds or waits on
/// them, so the map only ever contains accounts with in-flight work.
#[derive(Clone, Default)]
pub struct AccountLocks {
    locks: LockMap,
}

impl std::fmt::Debug for AccountLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountLocks ({} active)", self.active_count())
    }
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the account is free and returns a guard that keeps it locked until dropped.
    pub async fn lock(&self, account_id: i64) -> AccountGuard {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(account_id).or_default())
        };
        let guard = mutex.lock_owned().await;
        trace!("🔒️ Account #{account_id} locked");
        AccountGuard { account_id, locks: Arc::clone(&self.locks), guard: Some(guard) }
    }

    /// The number of accounts currently locked or being waited on.
    pub fn active_count(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

pub struct AccountGuard {
    account_id: i64,
    locks: LockMap,
    guard: Option<OwnedMutexGuard<()>>,
}

impl AccountGuard {
    pub fn account_id(&self) -> i64 {
        self.account_id
    }
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&self.account_id).is_some_and(|m| Arc::strong_count(m) == 1) {
            locks.remove(&self.account_id);
        }
        trace!("🔒️ Account #{} released", self.account_id);
    }
}
