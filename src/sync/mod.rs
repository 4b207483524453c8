//! Keeps per-section view state in step with live store subscriptions.
//!
//! A section (dashboard, accounts, settings) declares the paths it needs as
//! [`Binding`]s. [`Synchronizer`] opens one subscription per binding once the
//! session identity is ready, feeds each accepted snapshot to the section's
//! [`SectionModel`], and closes everything when the section goes away.
//! Snapshots travel as [`SyncEvent`]s through the app's event queue so the
//! model is only ever touched from the UI thread.

pub mod order;
pub mod sections;
pub mod synchronizer;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::store::{CollectionPath, DocPath, Document, OrderBy, Scope, Snapshot, StoreError};

pub use sections::{AccountsModel, DashboardModel, SettingsModel};
pub use synchronizer::{Phase, Synchronizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Dashboard,
    Accounts,
    Settings,
}

/// A snapshot (or failure) for one binding of one section, tagged with the
/// subscription generation it was opened under.
#[derive(Debug)]
pub struct SyncEvent {
    pub section: SectionId,
    pub generation: u64,
    pub binding: usize,
    pub payload: Result<Snapshot, StoreError>,
}

/// Where subscription callbacks post their events.
pub type EventSink = Arc<dyn Fn(SyncEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPolicy {
    pub field: &'static str,
    pub descending: bool,
    pub limit: Option<usize>,
}

impl OrderPolicy {
    pub fn newest_first(field: &'static str, limit: usize) -> Self {
        Self {
            field,
            descending: true,
            limit: Some(limit),
        }
    }

    pub fn to_order_by(&self) -> OrderBy {
        OrderBy {
            field: self.field.to_string(),
            descending: self.descending,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// One document. When it is missing and a default is given, the default
    /// is shown and written back once, filling only absent fields.
    Singleton {
        path: DocPath,
        default: Option<Document>,
    },
    List {
        path: CollectionPath,
        order: Option<OrderPolicy>,
    },
}

/// Local view state of one section.
pub trait SectionModel: Default + 'static {
    const SECTION: SectionId;

    /// The paths this section mirrors, indexed by position.
    fn bindings(scope: &Scope) -> Vec<Binding>;

    /// Replace the projection for `binding` with `snapshot`.
    fn apply(&mut self, binding: usize, snapshot: Snapshot);
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, serde_json::Error> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "expected an object, got {other}"
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, serde_json::Error> {
    serde_json::from_value(serde_json::Value::Object(doc))
}
