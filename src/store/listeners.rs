use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::{Query, Snapshot, SnapshotSink, StoreError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Open/closed flag held for the whole duration of a delivery, so closing
/// waits for an in-flight callback and nothing fires afterwards.
struct Gate {
    open: Mutex<bool>,
}

pub(crate) struct Listener {
    id: u64,
    pub(crate) query: Query,
    sink: SnapshotSink,
    gate: Arc<Gate>,
}

impl Listener {
    pub(crate) fn deliver(&self, result: Result<Snapshot, StoreError>) {
        let open = lock(&self.gate.open);
        if *open {
            (self.sink)(result);
        }
    }
}

pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, Arc<Listener>>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(HashMap::new()),
        })
    }

    pub(crate) fn register(
        self: &Arc<Self>,
        query: Query,
        sink: SnapshotSink,
    ) -> (Arc<Listener>, SubscriptionHandle) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let gate = Arc::new(Gate {
            open: Mutex::new(true),
        });
        let listener = Arc::new(Listener {
            id,
            query,
            sink,
            gate: gate.clone(),
        });
        lock(&self.listeners).insert(id, listener.clone());
        let handle = SubscriptionHandle {
            id,
            gate,
            registry: Arc::downgrade(self),
        };
        (listener, handle)
    }

    /// Listeners whose query sees `path`, oldest first.
    pub(crate) fn matching(&self, path: &super::DocPath) -> Vec<Arc<Listener>> {
        let mut out: Vec<_> = lock(&self.listeners)
            .values()
            .filter(|l| l.query.covers(path))
            .cloned()
            .collect();
        out.sort_by_key(|l| l.id);
        out
    }

    pub(crate) fn all(&self) -> Vec<Arc<Listener>> {
        let mut out: Vec<_> = lock(&self.listeners).values().cloned().collect();
        out.sort_by_key(|l| l.id);
        out
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.listeners).len()
    }

    fn remove(&self, id: u64) {
        lock(&self.listeners).remove(&id);
    }
}

/// Keeps a subscription alive. Closing (or dropping) it detaches the sink
/// synchronously: once `close` returns no further snapshot is delivered.
pub struct SubscriptionHandle {
    id: u64,
    gate: Arc<Gate>,
    registry: Weak<ListenerRegistry>,
}

impl SubscriptionHandle {
    pub fn close(&self) {
        *lock(&self.gate.open) = false;
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }

    pub fn is_closed(&self) -> bool {
        !*lock(&self.gate.open)
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocPath;
    use std::sync::atomic::AtomicUsize;

    fn counting_sink(counter: Arc<AtomicUsize>) -> SnapshotSink {
        Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn closed_handle_stops_delivery_and_unregisters() {
        let registry = ListenerRegistry::new();
        let path = DocPath::parse("a/b").unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let (listener, handle) =
            registry.register(Query::Document(path.clone()), counting_sink(hits.clone()));

        listener.deliver(Ok(Snapshot::Document(None)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.matching(&path).len(), 1);

        handle.close();
        listener.deliver(Ok(Snapshot::Document(None)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn dropping_handle_closes() {
        let registry = ListenerRegistry::new();
        let path = DocPath::parse("a/b").unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let (listener, handle) =
            registry.register(Query::Document(path), counting_sink(hits.clone()));
        drop(handle);
        listener.deliver(Ok(Snapshot::Document(None)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
