//! In-process store. Nothing survives the process; collection queries are
//! returned in document-id order and server-side ordering is not offered.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::listeners::{Listener, ListenerRegistry};
use super::merge::apply_write;
use super::{
    AuthProvider, DocEntry, DocPath, Document, Query, RemoteStore, Snapshot, SnapshotSink,
    StoreError, SubscriptionHandle, WriteMode,
};

#[derive(Default)]
struct MemoryInner {
    docs: BTreeMap<DocPath, Document>,
    tokens: HashMap<String, String>,
    anonymous_uid: Option<String>,
}

pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    listeners: Arc<ListenerRegistry>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
            listeners: ListenerRegistry::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `token` sign in as `uid`.
    pub fn register_token(&self, token: &str, uid: &str) {
        self.lock().tokens.insert(token.to_string(), uid.to_string());
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Report `message` as a failure to every live subscription, as a
    /// dropped connection would.
    pub fn broadcast_error(&self, message: &str) {
        let _guard = self.lock();
        for l in self.listeners.all() {
            l.deliver(Err(StoreError::Unavailable(message.to_string())));
        }
    }

    fn snapshot(inner: &MemoryInner, query: &Query) -> Snapshot {
        match query {
            Query::Document(path) => Snapshot::Document(inner.docs.get(path).cloned()),
            Query::Collection { path, .. } => Snapshot::Collection(
                inner
                    .docs
                    .iter()
                    .filter(|(p, _)| p.collection() == *path)
                    .map(|(p, d)| DocEntry {
                        id: p.id().to_string(),
                        data: d.clone(),
                    })
                    .collect(),
            ),
        }
    }

    fn notify(inner: &MemoryInner, listeners: Vec<Arc<Listener>>) {
        for l in listeners {
            l.deliver(Ok(Self::snapshot(inner, &l.query)));
        }
    }
}

impl RemoteStore for MemoryStore {
    fn subscribe(
        &self,
        query: Query,
        sink: SnapshotSink,
    ) -> Result<SubscriptionHandle, StoreError> {
        if let Query::Collection {
            order_by: Some(_), ..
        } = &query
        {
            return Err(StoreError::Unsupported(
                "memory store cannot order on the server".to_string(),
            ));
        }
        let inner = self.lock();
        let (listener, handle) = self.listeners.register(query, sink);
        Self::notify(&inner, vec![listener]);
        Ok(handle)
    }

    fn write(
        &self,
        path: &DocPath,
        document: Document,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if mode == WriteMode::Create && inner.docs.contains_key(path) {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        let existing = inner.docs.remove(path);
        let merged = apply_write(existing, document, mode);
        inner.docs.insert(path.clone(), merged);
        log::trace!("memory store wrote {path}");
        Self::notify(&inner, self.listeners.matching(path));
        Ok(())
    }

    fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        Ok(self.lock().docs.get(path).cloned())
    }
}

impl AuthProvider for MemoryStore {
    fn sign_in_with_token(&self, token: &str) -> Result<String, StoreError> {
        self.lock()
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| StoreError::Auth("unknown token".to_string()))
    }

    fn sign_in_anonymously(&self) -> Result<String, StoreError> {
        let mut inner = self.lock();
        let uid = inner
            .anonymous_uid
            .get_or_insert_with(|| format!("anon-{}", uuid::Uuid::new_v4()));
        Ok(uid.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CollectionPath;
    use serde_json::json;
    use std::sync::mpsc;

    fn doc(v: serde_json::Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    fn channel_sink() -> (SnapshotSink, mpsc::Receiver<Snapshot>) {
        let (tx, rx) = mpsc::channel();
        let sink: SnapshotSink = Arc::new(move |r: Result<Snapshot, StoreError>| {
            if let Ok(s) = r {
                let _ = tx.send(s);
            }
        });
        (sink, rx)
    }

    #[test]
    fn subscribe_delivers_current_then_changes() {
        let store = MemoryStore::new();
        let path = DocPath::parse("c/one").unwrap();
        let (sink, rx) = channel_sink();
        let _h = store.subscribe(Query::Document(path.clone()), sink).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Snapshot::Document(None));

        store.write(&path, doc(json!({"v": 1})), WriteMode::Overwrite).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            Snapshot::Document(Some(doc(json!({"v": 1}))))
        );
    }

    #[test]
    fn collection_only_sees_its_children() {
        let store = MemoryStore::new();
        let logs = CollectionPath::parse("u/1/logs").unwrap();
        store
            .write(&logs.doc("5").unwrap(), doc(json!({"t": 5})), WriteMode::Overwrite)
            .unwrap();
        store
            .write(&DocPath::parse("u/1/other/x").unwrap(), doc(json!({})), WriteMode::Overwrite)
            .unwrap();

        let (sink, rx) = channel_sink();
        let _h = store
            .subscribe(
                Query::Collection {
                    path: logs,
                    order_by: None,
                },
                sink,
            )
            .unwrap();
        match rx.try_recv().unwrap() {
            Snapshot::Collection(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].id, "5");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn create_refuses_to_replace() {
        let store = MemoryStore::new();
        let path = DocPath::parse("c/one").unwrap();
        store.write(&path, doc(json!({"v": 1})), WriteMode::Create).unwrap();
        let err = store
            .write(&path, doc(json!({"v": 2})), WriteMode::Create)
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.get(&path).unwrap(), Some(doc(json!({"v": 1}))));
    }

    #[test]
    fn anonymous_uid_is_stable_and_unknown_token_fails() {
        let store = MemoryStore::new();
        let a = store.sign_in_anonymously().unwrap();
        assert_eq!(a, store.sign_in_anonymously().unwrap());
        assert!(store.sign_in_with_token("nope").is_err());
        store.register_token("t1", "user-1");
        assert_eq!(store.sign_in_with_token("t1").unwrap(), "user-1");
    }
}
