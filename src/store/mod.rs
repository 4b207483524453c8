//! Remote document store: live subscriptions, writes and sign-in.
//!
//! Documents are JSON objects addressed by slash separated paths
//! (`collection/doc/collection/doc`). Subscribers get a full snapshot of
//! the queried document or collection on subscribe and again after every
//! change that touches it.

pub mod listeners;
pub mod memory;
pub mod merge;
pub mod path;
pub mod remote;
pub mod sqlite;

use std::sync::Arc;

use crate::config::StoreConfig;

pub use listeners::SubscriptionHandle;
pub use memory::MemoryStore;
pub use path::{CollectionPath, DocPath, Scope, is_valid_uid};
pub use remote::{AuthProvider, RemoteStore};
pub use sqlite::SqliteStore;

pub type Document = serde_json::Map<String, serde_json::Value>;

/// Receives every snapshot (or subscription failure) for one subscription.
/// Called from whichever thread produced the change; must not call back
/// into the store.
pub type SnapshotSink = Arc<dyn Fn(Result<Snapshot, StoreError>) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid path '{0}'")]
    InvalidPath(String),

    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed document at {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported query: {0}")]
    Unsupported(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("document already exists at {0}")]
    AlreadyExists(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocEntry {
    pub id: String,
    pub data: Document,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Current contents of a single document, `None` when it does not exist.
    Document(Option<Document>),
    /// Documents of a collection, in the order the store returned them.
    Collection(Vec<DocEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Document(DocPath),
    Collection {
        path: CollectionPath,
        order_by: Option<OrderBy>,
    },
}

impl Query {
    /// Whether a write to `doc` changes what this query sees.
    pub fn covers(&self, doc: &DocPath) -> bool {
        match self {
            Query::Document(p) => p == doc,
            Query::Collection { path, .. } => doc.collection() == *path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole document.
    Overwrite,
    /// Write the given fields, keep every other existing field.
    Merge,
    /// Only add fields that are not already present.
    FillMissing,
    /// Create the document; fails with [`StoreError::AlreadyExists`] when
    /// something is already stored at the path.
    Create,
}

/// Store and auth collaborators opened from one [`StoreConfig`].
pub struct StoreHandles {
    pub store: Arc<dyn RemoteStore>,
    pub auth: Arc<dyn AuthProvider>,
    /// The concrete SQLite store, when that backend was chosen.
    pub sqlite: Option<Arc<SqliteStore>>,
}

pub fn open_store(cfg: &StoreConfig) -> Result<StoreHandles, StoreError> {
    match cfg {
        StoreConfig::Sqlite { path } => {
            let store = Arc::new(SqliteStore::open(path)?);
            log::info!("opened sqlite store at {}", path.display());
            Ok(StoreHandles {
                store: store.clone(),
                auth: store.clone(),
                sqlite: Some(store),
            })
        }
        StoreConfig::Memory => {
            let store = Arc::new(MemoryStore::new());
            log::info!("using in-memory store; nothing will be persisted");
            Ok(StoreHandles {
                store: store.clone(),
                auth: store,
                sqlite: None,
            })
        }
    }
}
