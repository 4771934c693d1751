//! Change notification for successful mutations.
//!
//! Observers receive the address a mutation was issued against and nothing
//! else. Delivery is synchronous and fire-and-forget: the gateway does not
//! inspect what an observer does with the signal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Receives change notifications.
pub trait ChangeObserver: Send + Sync {
    /// Called once per successful mutation with the affected address.
    fn on_change(&self, address: &str);
}

impl<F> ChangeObserver for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_change(&self, address: &str) {
        self(address)
    }
}

/// Handle returned by [`ChangeNotifier::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registry of observers.
#[derive(Default)]
pub struct ChangeNotifier {
    observers: Mutex<Vec<(ObserverId, Arc<dyn ChangeObserver>)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("observers", &self.len())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Arc<dyn ChangeObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, observer));
        id
    }

    /// Removes an observer. Returns false if it was not registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self.lock();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Delivers `address` to every registered observer.
    ///
    /// The registry lock is released before observers run, so an observer
    /// may register or unregister without deadlocking.
    pub fn notify(&self, address: &str) {
        let snapshot: Vec<Arc<dyn ChangeObserver>> =
            self.lock().iter().map(|(_, o)| Arc::clone(o)).collect();
        tracing::debug!("notifying {} observer(s) of change at {}", snapshot.len(), address);
        for observer in snapshot {
            observer.on_change(address);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ObserverId, Arc<dyn ChangeObserver>)>> {
        // The list stays consistent even if an observer panicked mid-notify.
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
