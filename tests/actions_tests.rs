mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use warmup_dash::actions::{AccountService, ActionError, EVENT_CONNECTED, EVENT_REMOVED};
use warmup_dash::backend::{AccountSummary, BackendError};
use warmup_dash::domain::account::{AccountList, AccountStatus};
use warmup_dash::domain::log::{LogEntry, LogStatus};
use warmup_dash::domain::settings::SettingsField;
use warmup_dash::store::{MemoryStore, RemoteStore, Scope, WriteMode};
use warmup_dash::sync::from_document;

use common::{APP_ID, RecordingStore, StubBackend, ticking_clock};

fn account_list(store: &dyn RemoteStore, scope: &Scope) -> AccountList {
    store
        .get(&scope.account_list())
        .unwrap()
        .map(|doc| from_document(doc).unwrap())
        .unwrap_or_default()
}

fn log_at(store: &dyn RemoteStore, scope: &Scope, ts: i64) -> LogEntry {
    from_document(store.get(&scope.log(ts)).unwrap().unwrap()).unwrap()
}

#[test]
fn connect_records_active_account_and_success_log() {
    let store = RecordingStore::new(Arc::new(MemoryStore::new()));
    let backend = StubBackend::answering(vec![Ok(AccountSummary {
        email: "a@x.com".into(),
        sent_count: 12,
        received_count: 7,
    })]);
    let service = AccountService::with_clock(store.clone(), backend.clone(), ticking_clock(5000));
    let scope = Scope::new(APP_ID, "u1");

    let account = service.connect(&scope, " a@x.com ", "pw").unwrap();

    assert_eq!(account.status, AccountStatus::Active);
    assert_eq!(account.last_connected, 5000);
    assert_eq!(backend.requests.lock().unwrap()[0].user_id, "u1");

    let list = account_list(store.as_ref(), &scope);
    let stored = list.get("a@x.com").unwrap();
    assert_eq!(stored.sent_count, 12);
    assert_eq!(stored.received_count, 7);
    assert_eq!(stored.status, AccountStatus::Active);

    let log = log_at(store.as_ref(), &scope, 5000);
    assert_eq!(log.event, EVENT_CONNECTED);
    assert_eq!(log.email, "a@x.com");
    assert_eq!(log.status, LogStatus::Success);

    assert_eq!(store.writes_to(&scope.account_list(), WriteMode::Merge), 1);
}

#[test]
fn rejected_connect_writes_nothing() {
    let store = RecordingStore::new(Arc::new(MemoryStore::new()));
    let backend = StubBackend::answering(vec![Err(BackendError::Rejected(
        "bad credentials".into(),
    ))]);
    let service = AccountService::new(store.clone(), backend);
    let scope = Scope::new(APP_ID, "u1");

    let err = service.connect(&scope, "a@x.com", "wrong").unwrap_err();

    assert_eq!(err.to_string(), "bad credentials");
    assert!(matches!(err, ActionError::Backend(BackendError::Rejected(_))));
    assert!(store.writes().is_empty());
}

#[test]
fn invalid_input_never_reaches_backend() {
    let store = RecordingStore::new(Arc::new(MemoryStore::new()));
    let backend = StubBackend::accepting();
    let service = AccountService::new(store.clone(), backend.clone());
    let scope = Scope::new(APP_ID, "u1");

    assert!(matches!(
        service.connect(&scope, "not-an-email", "pw"),
        Err(ActionError::InvalidInput(_))
    ));
    assert!(matches!(
        service.connect(&scope, "a@x.com", ""),
        Err(ActionError::InvalidInput(_))
    ));
    assert_eq!(backend.calls(), 0);
    assert!(store.writes().is_empty());
}

#[test]
fn reconnecting_keeps_a_single_entry() {
    let store = Arc::new(MemoryStore::new());
    let service = AccountService::with_clock(
        store.clone(),
        StubBackend::accepting(),
        ticking_clock(100),
    );
    let scope = Scope::new(APP_ID, "u1");

    service.connect(&scope, "a@x.com", "pw").unwrap();
    service.connect(&scope, "a@x.com", "pw").unwrap();

    let list = account_list(store.as_ref(), &scope);
    assert_eq!(list.len(), 1);
    assert_eq!(list.get("a@x.com").unwrap().last_connected, 101);
}

#[test]
fn remove_keeps_the_others_and_logs_a_warning() {
    let store = Arc::new(MemoryStore::new());
    let service = AccountService::with_clock(
        store.clone(),
        StubBackend::accepting(),
        ticking_clock(1),
    );
    let scope = Scope::new(APP_ID, "u1");
    service.connect(&scope, "a@x.com", "pw").unwrap();
    service.connect(&scope, "b@x.com", "pw").unwrap();

    let current = account_list(store.as_ref(), &scope);
    service.remove(&scope, &current, "a@x.com").unwrap();

    let list = account_list(store.as_ref(), &scope);
    let emails: Vec<&str> = list.iter().map(|a| a.email.as_str()).collect();
    assert_eq!(emails, vec!["b@x.com"]);

    let log = log_at(store.as_ref(), &scope, 3);
    assert_eq!(log.event, EVENT_REMOVED);
    assert_eq!(log.email, "a@x.com");
    assert_eq!(log.status, LogStatus::Warning);
}

#[test]
fn removing_unknown_account_is_not_found() {
    let store = RecordingStore::new(Arc::new(MemoryStore::new()));
    let service = AccountService::new(store.clone(), StubBackend::accepting());
    let scope = Scope::new(APP_ID, "u1");

    let err = service
        .remove(&scope, &AccountList::default(), "ghost@x.com")
        .unwrap_err();

    assert!(matches!(err, ActionError::NotFound(_)));
    assert!(store.writes().is_empty());
}

#[test]
fn setting_update_merges_one_field() {
    let store = Arc::new(MemoryStore::new());
    let scope = Scope::new(APP_ID, "u1");
    store
        .write(
            &scope.warmup_settings(),
            json!({"enabled": true, "dailyLimit": 40, "rampUpStep": 5, "replyRate": 30})
                .as_object()
                .unwrap()
                .clone(),
            WriteMode::Overwrite,
        )
        .unwrap();
    let service = AccountService::new(store.clone(), StubBackend::accepting());

    service
        .update_setting(&scope, SettingsField::DailyLimit, json!(55))
        .unwrap();

    let doc = store.get(&scope.warmup_settings()).unwrap().unwrap();
    assert_eq!(doc.get("dailyLimit"), Some(&json!(55)));
    assert_eq!(doc.get("replyRate"), Some(&json!(30)));
    assert_eq!(doc.get("enabled"), Some(&json!(true)));
}

#[test]
fn logs_in_the_same_millisecond_are_all_kept() {
    let store = Arc::new(MemoryStore::new());
    let service =
        AccountService::with_clock(store.clone(), StubBackend::accepting(), Arc::new(|| 777));
    let scope = Scope::new(APP_ID, "u1");

    service.connect(&scope, "a@x.com", "pw").unwrap();
    service.connect(&scope, "b@x.com", "pw").unwrap();
    let current = account_list(store.as_ref(), &scope);
    service.remove(&scope, &current, "a@x.com").unwrap();

    let first = log_at(store.as_ref(), &scope, 777);
    assert_eq!(first.email, "a@x.com");
    assert_eq!(first.event, EVENT_CONNECTED);

    let entry = |id: &str| -> LogEntry {
        from_document(store.get(&scope.log_entry(id)).unwrap().unwrap()).unwrap()
    };
    let second = entry("777-001");
    assert_eq!(second.id, "777-001");
    assert_eq!(second.timestamp, 777);
    assert_eq!(second.email, "b@x.com");
    let third = entry("777-002");
    assert_eq!(third.event, EVENT_REMOVED);
    assert_eq!(third.status, LogStatus::Warning);
}
