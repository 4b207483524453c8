#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};

use warmup_dash::actions::Clock;
use warmup_dash::auth::{Identity, IdentityOrigin};
use warmup_dash::backend::{AccountSummary, BackendError, ConnectRequest, WarmupBackend};
use warmup_dash::store::{
    DocPath, Document, Query, RemoteStore, SnapshotSink, StoreError, SubscriptionHandle, WriteMode,
};
use warmup_dash::sync::{EventSink, SectionModel, SyncEvent, Synchronizer};

pub const APP_ID: &str = "test-app";

pub fn identity(uid: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        origin: IdentityOrigin::Token,
    }
}

pub fn channel_sink() -> (EventSink, Receiver<SyncEvent>) {
    let (tx, rx) = mpsc::channel();
    let sink: EventSink = Arc::new(move |ev: SyncEvent| {
        let _ = tx.send(ev);
    });
    (sink, rx)
}

/// Feed every queued event to `sync`. Returns how many changed the view.
pub fn drain<M: SectionModel>(sync: &mut Synchronizer<M>, rx: &Receiver<SyncEvent>) -> usize {
    let mut applied = 0;
    while let Ok(ev) = rx.try_recv() {
        if sync.handle(ev) {
            applied += 1;
        }
    }
    applied
}

/// Clock that ticks one millisecond per call, starting at `start`.
pub fn ticking_clock(start: i64) -> Clock {
    let now = Arc::new(AtomicI64::new(start));
    Arc::new(move || now.fetch_add(1, Ordering::SeqCst))
}

/// Wraps a store and remembers every write.
pub struct RecordingStore {
    inner: Arc<dyn RemoteStore>,
    writes: Mutex<Vec<(String, WriteMode)>>,
}

impl RecordingStore {
    pub fn new(inner: Arc<dyn RemoteStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            writes: Mutex::new(Vec::new()),
        })
    }

    pub fn writes(&self) -> Vec<(String, WriteMode)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn writes_to(&self, path: &DocPath, mode: WriteMode) -> usize {
        self.writes()
            .iter()
            .filter(|(p, m)| p == path.as_str() && *m == mode)
            .count()
    }
}

impl RemoteStore for RecordingStore {
    fn subscribe(
        &self,
        query: Query,
        sink: SnapshotSink,
    ) -> Result<SubscriptionHandle, StoreError> {
        self.inner.subscribe(query, sink)
    }

    fn write(
        &self,
        path: &DocPath,
        document: Document,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        self.writes
            .lock()
            .unwrap()
            .push((path.as_str().to_string(), mode));
        self.inner.write(path, document, mode)
    }

    fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        self.inner.get(path)
    }

    fn supports_server_ordering(&self) -> bool {
        self.inner.supports_server_ordering()
    }
}

/// Backend that answers from a script and records what it was asked.
#[derive(Default)]
pub struct StubBackend {
    answers: Mutex<VecDeque<Result<AccountSummary, BackendError>>>,
    pub requests: Mutex<Vec<ConnectRequest>>,
}

impl StubBackend {
    pub fn answering(answers: Vec<Result<AccountSummary, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl WarmupBackend for StubBackend {
    fn connect(&self, request: &ConnectRequest) -> Result<AccountSummary, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(AccountSummary {
                    email: request.email.clone(),
                    sent_count: 0,
                    received_count: 0,
                })
            })
    }
}
