use std::sync::{Arc, RwLock};

use super::BalanceState;

/// Versioned, copy-on-write holder of the current [`BalanceState`].
///
/// Readers take an `Arc` snapshot and never observe a partially applied update.
pub struct BalanceStore {
    inner: RwLock<(u64, Arc<BalanceState>)>,
}

impl BalanceStore {
    pub fn new() -> Self {
        Self::with_state(BalanceState::default())
    }

    pub fn with_state(state: BalanceState) -> Self {
        Self {
            inner: RwLock::new((0, Arc::new(state))),
        }
    }

    pub fn snapshot(&self) -> Arc<BalanceState> {
        let guard = self.inner.read().expect("balance store lock poisoned");
        Arc::clone(&guard.1)
    }

    pub fn version(&self) -> u64 {
        self.inner.read().expect("balance store lock poisoned").0
    }

    /// Apply `f` to the state and bump the version.
    pub fn update<R>(&self, f: impl FnOnce(&mut BalanceState) -> R) -> R {
        let mut guard = self.inner.write().expect("balance store lock poisoned");
        let result = f(Arc::make_mut(&mut guard.1));
        guard.0 += 1;
        result
    }
}

impl Default for BalanceStore {
    fn default() -> Self {
        Self::new()
    }
}
