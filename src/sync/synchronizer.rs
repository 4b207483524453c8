use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::auth::Identity;
use crate::store::{
    DocPath, Document, Query, RemoteStore, Scope, Snapshot, SnapshotSink, SubscriptionHandle,
    WriteMode,
};

use super::order::order_and_truncate;
use super::{Binding, EventSink, SectionModel, SyncEvent};

/// Generations are unique across the process, so an event from a section
/// that was unmounted can never match a section mounted later.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Mounted, waiting for the identity.
    Uninitialized,
    /// Subscriptions open, not every binding has reported yet.
    SubscriptionPending,
    SubscriptionActive,
    /// Unmounted. Terminal.
    TornDown,
}

pub struct Synchronizer<M: SectionModel> {
    store: Arc<dyn RemoteStore>,
    sink: EventSink,
    app_id: String,
    phase: Phase,
    generation: u64,
    scope: Option<Scope>,
    bindings: Vec<Binding>,
    handles: Vec<SubscriptionHandle>,
    settled: Vec<bool>,
    healed: Vec<bool>,
    server_ordering: bool,
    model: M,
}

impl<M: SectionModel> Synchronizer<M> {
    /// Mount the section. Subscriptions open right away when the identity
    /// is already known, otherwise on [`Self::on_identity_ready`].
    pub fn mount(
        store: Arc<dyn RemoteStore>,
        sink: EventSink,
        app_id: &str,
        identity: Option<&Identity>,
    ) -> Self {
        let mut sync = Self {
            store,
            sink,
            app_id: app_id.to_string(),
            phase: Phase::Uninitialized,
            generation: next_generation(),
            scope: None,
            bindings: Vec::new(),
            handles: Vec::new(),
            settled: Vec::new(),
            healed: Vec::new(),
            server_ordering: false,
            model: M::default(),
        };
        if let Some(identity) = identity {
            sync.on_identity_ready(identity);
        }
        sync
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of subscriptions currently held.
    pub fn open_subscriptions(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_closed()).count()
    }

    pub fn on_identity_ready(&mut self, identity: &Identity) {
        let scope = Scope::new(&self.app_id, &identity.uid);
        match self.phase {
            Phase::TornDown => {
                log::debug!("{:?}: identity ready after unmount, ignoring", M::SECTION);
            }
            Phase::Uninitialized => self.open(scope),
            Phase::SubscriptionPending | Phase::SubscriptionActive => {
                if self.scope.as_ref() == Some(&scope) {
                    return;
                }
                log::info!("{:?}: identity changed, resubscribing", M::SECTION);
                self.close_all();
                self.model = M::default();
                self.open(scope);
            }
        }
    }

    fn open(&mut self, scope: Scope) {
        self.generation = next_generation();
        self.server_ordering = self.store.supports_server_ordering();
        let bindings = M::bindings(&scope);
        self.settled = vec![false; bindings.len()];
        self.healed = vec![false; bindings.len()];
        self.phase = Phase::SubscriptionPending;

        for (index, binding) in bindings.iter().enumerate() {
            let query = match binding {
                Binding::Singleton { path, .. } => Query::Document(path.clone()),
                Binding::List { path, order } => Query::Collection {
                    path: path.clone(),
                    order_by: order
                        .as_ref()
                        .filter(|_| self.server_ordering)
                        .map(|o| o.to_order_by()),
                },
            };

            let sink = self.sink.clone();
            let section = M::SECTION;
            let generation = self.generation;
            let callback: SnapshotSink = Arc::new(move |payload| {
                sink(SyncEvent {
                    section,
                    generation,
                    binding: index,
                    payload,
                })
            });

            match self.store.subscribe(query, callback) {
                Ok(handle) => self.handles.push(handle),
                Err(e) => {
                    log::warn!("{:?}: could not subscribe binding {index}: {e}", M::SECTION);
                    self.settled[index] = true;
                }
            }
        }

        log::debug!(
            "{:?}: opened {} subscription(s) for {} (generation {})",
            M::SECTION,
            self.handles.len(),
            scope.uid(),
            self.generation
        );
        self.bindings = bindings;
        self.scope = Some(scope);
        self.refresh_phase();
    }

    fn close_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.close();
        }
    }

    /// Apply one event from the queue. Returns whether the view changed.
    /// Events from another section, an older generation, or arriving after
    /// unmount are dropped.
    pub fn handle(&mut self, event: SyncEvent) -> bool {
        if event.section != M::SECTION || event.generation != self.generation {
            log::trace!("{:?}: dropping stale event", M::SECTION);
            return false;
        }
        if !matches!(
            self.phase,
            Phase::SubscriptionPending | Phase::SubscriptionActive
        ) {
            return false;
        }
        let index = event.binding;
        let Some(binding) = self.bindings.get(index).cloned() else {
            return false;
        };

        let snapshot = match event.payload {
            Ok(s) => s,
            Err(e) => {
                log::warn!(
                    "{:?}: subscription {index} failed: {e}; keeping last known view",
                    M::SECTION
                );
                self.settled[index] = true;
                self.refresh_phase();
                return false;
            }
        };

        let projected = match (binding, snapshot) {
            (
                Binding::Singleton {
                    path,
                    default: Some(default),
                },
                Snapshot::Document(None),
            ) => {
                self.heal(index, &path, &default);
                Snapshot::Document(Some(default))
            }
            (
                Binding::List {
                    order: Some(order), ..
                },
                Snapshot::Collection(entries),
            ) if !self.server_ordering => {
                Snapshot::Collection(order_and_truncate(entries, &order))
            }
            (_, snapshot) => snapshot,
        };

        self.model.apply(index, projected);
        self.settled[index] = true;
        self.refresh_phase();
        true
    }

    /// Write the default for a missing singleton, once per subscription.
    fn heal(&mut self, index: usize, path: &DocPath, default: &Document) {
        if self.healed[index] {
            return;
        }
        self.healed[index] = true;
        log::info!("{:?}: {path} missing, writing defaults", M::SECTION);
        if let Err(e) = self
            .store
            .write(path, default.clone(), WriteMode::FillMissing)
        {
            log::warn!("{:?}: could not initialise {path}: {e}", M::SECTION);
        }
    }

    fn refresh_phase(&mut self) {
        if self.phase == Phase::SubscriptionPending && self.settled.iter().all(|s| *s) {
            self.phase = Phase::SubscriptionActive;
        }
    }

    /// Close every subscription. Nothing is delivered to this section
    /// afterwards.
    pub fn unmount(&mut self) {
        if self.phase == Phase::TornDown {
            return;
        }
        self.close_all();
        self.phase = Phase::TornDown;
        log::debug!("{:?}: unmounted", M::SECTION);
    }
}

impl<M: SectionModel> Drop for Synchronizer<M> {
    fn drop(&mut self) {
        self.unmount();
    }
}
