//! Business notification fan-out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

/// Receives engine notifications.
///
/// Callbacks run on the loading task's thread; keep them quick and hand
/// heavy work off elsewhere.
pub trait ConfigObserver: Send + Sync {
    /// A load or reload batch completed; `names` lists the configs whose
    /// data changed. Every observer gets its own copy of the list.
    fn on_batch_change(&self, names: Vec<String>);

    /// The very first full load completed. Fires once per engine, ever.
    fn on_first_load_done(&self) {}
}

/// Ordered observer list plus the first-load latch.
#[derive(Default)]
pub(crate) struct ObserverHub {
    observers: RwLock<Vec<Arc<dyn ConfigObserver>>>,
    first_load_done: AtomicBool,
}

impl ObserverHub {
    /// Appends an observer; notification order is registration order.
    pub(crate) fn register(&self, observer: Arc<dyn ConfigObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Notifies every observer of a completed batch. Empty batches are
    /// swallowed. Each observer receives an independent copy of the name
    /// list, so one observer mutating its copy cannot affect another.
    pub(crate) fn notify_batch(&self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        debug!(count = names.len(), "dispatching batch change notifications");
        // Callbacks run outside the lock so an observer may register
        // further observers.
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.on_batch_change(names.to_vec());
        }
    }

    /// Fires the first-load signal if it has not fired yet.
    pub(crate) fn notify_first_load(&self) {
        if self
            .first_load_done
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        debug!("first full load complete");
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.on_first_load_done();
        }
    }
}
