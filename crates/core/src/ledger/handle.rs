use std::sync::{Arc, Mutex, MutexGuard};

use crate::{LedgerRegistry, Result, ShizuError};

/// Shared view over the current [`LedgerRegistry`].
///
/// Cloned handles point at the same registry, so replacing its contents
/// through one handle is seen by every lineup holding another.
#[derive(Clone, Default)]
pub struct LedgerHandle {
    shared: Arc<Mutex<LedgerRegistry>>,
}

impl LedgerHandle {
    pub fn new(ledger: LedgerRegistry) -> Self {
        Self {
            shared: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Locks the registry. Lineup methods lock it themselves, so do not hold
    /// the guard across a call into a [`Lineup`](crate::Lineup) bound to this
    /// handle; the mutex is not reentrant and the call would deadlock.
    pub fn lock(&self) -> Result<MutexGuard<'_, LedgerRegistry>> {
        self.shared
            .lock()
            .map_err(|_| ShizuError::msg("ledger has been poisoned"))
    }

    /// Swaps in a whole new registry and returns the previous one.
    pub fn replace(&self, ledger: LedgerRegistry) -> Result<LedgerRegistry> {
        let mut slot = self.lock()?;
        Ok(std::mem::replace(&mut *slot, ledger))
    }

    /// Whether both handles refer to the same registry.
    pub fn same_ledger(&self, other: &LedgerHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl std::fmt::Debug for LedgerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerHandle").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_replacement() {
        let handle = LedgerHandle::new(LedgerRegistry::new());
        let view = handle.clone();
        handle.lock().unwrap().create_dj();
        assert!(view.lock().unwrap().contains_dj("new-dj"));

        let previous = handle.replace(LedgerRegistry::new()).unwrap();
        assert!(previous.contains_dj("new-dj"));
        assert!(!view.lock().unwrap().contains_dj("new-dj"));
        assert!(view.same_ledger(&handle));
    }
}
