use super::{Document, DocPath, Query, SnapshotSink, StoreError, SubscriptionHandle, WriteMode};

/// A realtime document store.
pub trait RemoteStore: Send + Sync {
    /// Start a live subscription. The current snapshot is delivered to
    /// `sink` before this returns, later ones after each relevant change.
    /// Dropping or closing the handle detaches the sink.
    fn subscribe(&self, query: Query, sink: SnapshotSink)
    -> Result<SubscriptionHandle, StoreError>;

    fn write(&self, path: &DocPath, document: Document, mode: WriteMode)
    -> Result<(), StoreError>;

    fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError>;

    /// Whether collection queries honour [`super::OrderBy`].
    fn supports_server_ordering(&self) -> bool {
        false
    }

    /// Pick up changes committed by other processes and notify subscribers.
    fn poll_external_changes(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// The sign-in half of the store service. Both calls return a user id.
pub trait AuthProvider: Send + Sync {
    fn sign_in_with_token(&self, token: &str) -> Result<String, StoreError>;

    fn sign_in_anonymously(&self) -> Result<String, StoreError>;
}
