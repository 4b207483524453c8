mod common;

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use pretty_assertions::assert_eq;

use warmup_dash::actions::ActionError;
use warmup_dash::auth::IdentityOrigin;
use warmup_dash::backend::BackendError;
use warmup_dash::config::{Config, HostEnvironment, StoreConfig};
use warmup_dash::context::AppContext;
use warmup_dash::domain::account::AccountStatus;
use warmup_dash::event::{AppEvent, sync_sink};
use warmup_dash::store::{MemoryStore, StoreHandles};
use warmup_dash::sync::Phase;
use warmup_dash::terminal::state::{AppState, NoticeKind, Page};

use common::APP_ID;

fn context(store: &Arc<MemoryStore>, token: Option<&str>) -> AppContext {
    let env = HostEnvironment {
        app_id: APP_ID.to_string(),
        store: StoreConfig::Memory,
        auth_token: token.map(str::to_string),
    };
    let handles = StoreHandles {
        store: store.clone(),
        auth: store.clone(),
        sqlite: None,
    };
    AppContext::with_store(env, Config::default(), handles).unwrap()
}

fn pump(state: &mut AppState, ctx: &AppContext, rx: &Receiver<AppEvent>) {
    while let Ok(ev) = rx.try_recv() {
        state.apply_event(ctx, ev);
    }
}

fn signed_in(store: &Arc<MemoryStore>) -> (AppContext, AppState, Receiver<AppEvent>) {
    store.register_token("tok", "u1");
    let ctx = context(store, Some("tok"));
    let (tx, rx) = mpsc::channel();
    let mut state = AppState::new(&ctx, sync_sink(tx.clone()));

    ctx.start_sign_in(tx);
    let ready = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    state.apply_event(&ctx, ready);
    pump(&mut state, &ctx, &rx);
    (ctx, state, rx)
}

#[test]
fn sign_in_with_token_activates_current_page() {
    let store = Arc::new(MemoryStore::new());
    let (ctx, state, _rx) = signed_in(&store);

    let id = ctx.identity.get().unwrap();
    assert_eq!(id.uid, "u1");
    assert_eq!(id.origin, IdentityOrigin::Token);
    assert_eq!(ctx.scope().unwrap().uid(), "u1");
    assert_eq!(state.page, Page::Dashboard);
    assert_eq!(state.view.phase(), Phase::SubscriptionActive);
}

#[test]
fn unknown_token_falls_back_to_local_identity() {
    let store = Arc::new(MemoryStore::new());
    let ctx = context(&store, Some("expired"));
    let (tx, rx) = mpsc::channel();
    ctx.start_sign_in(tx);

    let AppEvent::IdentityReady(id) = rx.recv_timeout(Duration::from_secs(5)).unwrap() else {
        panic!("expected an identity");
    };
    assert_eq!(id.origin, IdentityOrigin::LocalFallback);
    assert!(id.uid.starts_with("local-"));
    assert!(!id.is_persistent());
}

#[test]
fn view_waits_for_identity() {
    let store = Arc::new(MemoryStore::new());
    let ctx = context(&store, Some("tok"));
    let (tx, _rx) = mpsc::channel();
    let state = AppState::new(&ctx, sync_sink(tx));

    assert_eq!(state.view.phase(), Phase::Uninitialized);
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn only_the_current_page_is_subscribed() {
    let store = Arc::new(MemoryStore::new());
    let (ctx, mut state, rx) = signed_in(&store);
    assert_eq!(store.subscriber_count(), 2);

    state.switch_page(&ctx, Page::Accounts);
    assert_eq!(store.subscriber_count(), 1);
    pump(&mut state, &ctx, &rx);
    assert_eq!(state.view.phase(), Phase::SubscriptionActive);

    state.switch_page(&ctx, Page::Settings);
    assert_eq!(store.subscriber_count(), 1);

    state.unmount();
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn connect_outcomes_update_local_rows() {
    let store = Arc::new(MemoryStore::new());
    let (ctx, mut state, rx) = signed_in(&store);
    state.switch_page(&ctx, Page::Accounts);
    pump(&mut state, &ctx, &rx);

    state
        .pending
        .insert("a@x.com".into(), AccountStatus::Connecting);
    state.apply_event(
        &ctx,
        AppEvent::ConnectFinished {
            email: "a@x.com".into(),
            result: Err(ActionError::Backend(BackendError::Rejected(
                "bad credentials".into(),
            ))),
        },
    );

    let rows = state.account_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, AccountStatus::Error);
    assert!(rows[0].account.is_none());
    let notice = state.notice.as_ref().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.text, "bad credentials");

    state
        .pending
        .insert("b@x.com".into(), AccountStatus::Connecting);
    state.apply_event(
        &ctx,
        AppEvent::ConnectFinished {
            email: "b@x.com".into(),
            result: Err(ActionError::InvalidInput("Enter the account password.".into())),
        },
    );
    assert_eq!(state.account_rows().len(), 1);
}
