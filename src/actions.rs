//! User-triggered mutations: connect an account, remove one, edit settings.
//!
//! Every change goes to the store and comes back to the views through
//! their subscriptions; nothing here touches view state directly.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::backend::{BackendError, ConnectRequest, WarmupBackend};
use crate::domain::account::{ACCOUNTS_FIELD, AccountList, AccountStatus, EmailAccount};
use crate::domain::log::{LogEntry, LogStatus};
use crate::domain::now_millis;
use crate::domain::settings::SettingsField;
use crate::store::{Document, RemoteStore, Scope, StoreError, WriteMode};
use crate::sync::to_document;

pub const EVENT_CONNECTED: &str = "Account Connected";
pub const EVENT_REMOVED: &str = "Account Removed";

/// Log entries allowed within one millisecond.
const MAX_LOG_SUFFIX: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{0}")]
    InvalidInput(String),

    /// The backend refused or could not be reached. Displays as its reason.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A store write failed. After a successful connect the backend side
    /// is not rolled back.
    #[error("could not save: {0}")]
    Persist(#[from] StoreError),

    #[error("{0} is not in the account list")]
    NotFound(String),

    #[error("could not encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub struct AccountService {
    store: Arc<dyn RemoteStore>,
    backend: Arc<dyn WarmupBackend>,
    clock: Clock,
}

fn single_field(key: &str, value: Value) -> Document {
    let mut doc = Map::new();
    doc.insert(key.to_string(), value);
    doc
}

impl AccountService {
    pub fn new(store: Arc<dyn RemoteStore>, backend: Arc<dyn WarmupBackend>) -> Self {
        Self::with_clock(store, backend, Arc::new(now_millis))
    }

    pub fn with_clock(
        store: Arc<dyn RemoteStore>,
        backend: Arc<dyn WarmupBackend>,
        clock: Clock,
    ) -> Self {
        Self {
            store,
            backend,
            clock,
        }
    }

    /// Connect `email` through the backend and record it. Blocks on the
    /// backend call, so run it off the UI thread. Nothing is written when
    /// the backend says no.
    pub fn connect(
        &self,
        scope: &Scope,
        email: &str,
        credential: &str,
    ) -> Result<EmailAccount, ActionError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ActionError::InvalidInput(
                "Enter a valid email address.".to_string(),
            ));
        }
        if credential.is_empty() {
            return Err(ActionError::InvalidInput(
                "Enter the account password.".to_string(),
            ));
        }

        let request = ConnectRequest {
            email: email.to_string(),
            password: credential.to_string(),
            user_id: scope.uid().to_string(),
        };
        let summary = self.backend.connect(&request)?;

        let now = (self.clock)();
        let account = EmailAccount {
            email: email.to_string(),
            status: AccountStatus::Active,
            sent_count: summary.sent_count,
            received_count: summary.received_count,
            last_connected: now,
        };

        let entry = single_field(email, serde_json::to_value(&account)?);
        self.store.write(
            &scope.account_list(),
            single_field(ACCOUNTS_FIELD, Value::Object(entry)),
            WriteMode::Merge,
        )?;
        self.append_log(scope, now, EVENT_CONNECTED, email, LogStatus::Success)?;
        log::info!("connected {email}");
        Ok(account)
    }

    /// Rewrite the account list without `email`. `current` is the list as
    /// the caller last saw it; concurrent removals elsewhere race, last
    /// writer wins.
    pub fn remove(
        &self,
        scope: &Scope,
        current: &AccountList,
        email: &str,
    ) -> Result<(), ActionError> {
        if !current.contains(email) {
            return Err(ActionError::NotFound(email.to_string()));
        }
        let remaining = current.without(email);
        self.store.write(
            &scope.account_list(),
            to_document(&remaining)?,
            WriteMode::Overwrite,
        )?;
        let now = (self.clock)();
        self.append_log(scope, now, EVENT_REMOVED, email, LogStatus::Warning)?;
        log::info!("removed {email}");
        Ok(())
    }

    /// Merge one settings field.
    pub fn update_setting(
        &self,
        scope: &Scope,
        field: SettingsField,
        value: Value,
    ) -> Result<(), ActionError> {
        self.store.write(
            &scope.warmup_settings(),
            single_field(field.key(), value),
            WriteMode::Merge,
        )?;
        Ok(())
    }

    /// Create a new log entry under `logs/{timestamp}`. Entries are never
    /// overwritten: a second entry in the same millisecond gets a numbered
    /// suffix.
    fn append_log(
        &self,
        scope: &Scope,
        timestamp: i64,
        event: &str,
        email: &str,
        status: LogStatus,
    ) -> Result<(), ActionError> {
        let base = LogEntry::new(timestamp, event, email, status);
        for attempt in 0..MAX_LOG_SUFFIX {
            let id = if attempt == 0 {
                timestamp.to_string()
            } else {
                format!("{timestamp}-{attempt:03}")
            };
            let path = scope.log_entry(&id);
            let entry = LogEntry {
                id,
                ..base.clone()
            };
            match self.store.write(&path, to_document(&entry)?, WriteMode::Create) {
                Ok(()) => return Ok(()),
                Err(StoreError::AlreadyExists(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::AlreadyExists(scope.log(timestamp).to_string()).into())
    }
}
