use std::collections::BTreeMap;

use ratatui::widgets::ListState;

use crate::actions::ActionError;
use crate::context::AppContext;
use crate::domain::account::{AccountStatus, EmailAccount};
use crate::domain::settings::SettingsField;
use crate::event::AppEvent;
use crate::sync::{
    AccountsModel, DashboardModel, EventSink, Phase, SettingsModel, SyncEvent, Synchronizer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Accounts,
    Settings,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Dashboard, Page::Accounts, Page::Settings];

    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Accounts => "Accounts",
            Page::Settings => "Settings",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Page::Dashboard => 0,
            Page::Accounts => 1,
            Page::Settings => 2,
        }
    }

    pub fn next(self) -> Page {
        Page::ALL[(self.index() + 1) % Page::ALL.len()]
    }
}

/// The section currently on screen. Only this one holds subscriptions.
pub enum View {
    Dashboard(Synchronizer<DashboardModel>),
    Accounts(Synchronizer<AccountsModel>),
    Settings(Synchronizer<SettingsModel>),
}

impl View {
    fn mount(page: Page, ctx: &AppContext, sink: &EventSink) -> View {
        let store = ctx.store.clone();
        let sink = sink.clone();
        let app_id = ctx.env.app_id.as_str();
        let identity = ctx.identity.get();
        match page {
            Page::Dashboard => View::Dashboard(Synchronizer::mount(store, sink, app_id, identity)),
            Page::Accounts => View::Accounts(Synchronizer::mount(store, sink, app_id, identity)),
            Page::Settings => View::Settings(Synchronizer::mount(store, sink, app_id, identity)),
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            View::Dashboard(s) => s.phase(),
            View::Accounts(s) => s.phase(),
            View::Settings(s) => s.phase(),
        }
    }

    fn on_identity_ready(&mut self, identity: &crate::auth::Identity) {
        match self {
            View::Dashboard(s) => s.on_identity_ready(identity),
            View::Accounts(s) => s.on_identity_ready(identity),
            View::Settings(s) => s.on_identity_ready(identity),
        }
    }

    fn handle(&mut self, event: SyncEvent) -> bool {
        match self {
            View::Dashboard(s) => s.handle(event),
            View::Accounts(s) => s.handle(event),
            View::Settings(s) => s.handle(event),
        }
    }

    fn unmount(&mut self) {
        match self {
            View::Dashboard(s) => s.unmount(),
            View::Accounts(s) => s.unmount(),
            View::Settings(s) => s.unmount(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Dismissible message shown under the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Email,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectForm {
    pub email: String,
    pub password: String,
    pub field: FormField,
}

impl ConnectForm {
    pub fn active_mut(&mut self) -> &mut String {
        match self.field {
            FormField::Email => &mut self.email,
            FormField::Password => &mut self.password,
        }
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            FormField::Email => FormField::Password,
            FormField::Password => FormField::Email,
        };
    }
}

/// One line of the accounts table: a stored account, or a local-only row
/// for a connect in flight or one that just failed.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRow {
    pub email: String,
    pub status: AccountStatus,
    pub account: Option<EmailAccount>,
}

pub struct AppState {
    pub page: Page,
    pub view: View,
    pub list_state: ListState,
    pub settings_cursor: usize,
    pub form: Option<ConnectForm>,
    pub url_input: Option<String>,
    /// `Connecting` / `Error` rows that are never persisted.
    pub pending: BTreeMap<String, AccountStatus>,
    pub notice: Option<Notice>,
    sink: EventSink,
}

impl AppState {
    pub fn new(ctx: &AppContext, sink: EventSink) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            page: Page::Dashboard,
            view: View::mount(Page::Dashboard, ctx, &sink),
            list_state,
            settings_cursor: 0,
            form: None,
            url_input: None,
            pending: BTreeMap::new(),
            notice: None,
            sink,
        }
    }

    pub fn switch_page(&mut self, ctx: &AppContext, page: Page) {
        if page == self.page {
            return;
        }
        self.view.unmount();
        self.view = View::mount(page, ctx, &self.sink);
        self.page = page;
        self.form = None;
        self.url_input = None;
        self.list_state.select(Some(0));
    }

    pub fn unmount(&mut self) {
        self.view.unmount();
    }

    pub fn apply_event(&mut self, ctx: &AppContext, event: AppEvent) {
        match event {
            AppEvent::IdentityReady(identity) => {
                if !ctx.identity.mark_ready(identity) {
                    log::debug!("identity already ready, ignoring second sign-in result");
                    return;
                }
                if let Some(id) = ctx.identity.get() {
                    self.view.on_identity_ready(id);
                }
            }
            AppEvent::Sync(event) => {
                self.view.handle(event);
                self.clamp_selection();
            }
            AppEvent::ConnectFinished { email, result } => self.connect_finished(email, result),
        }
    }

    fn connect_finished(&mut self, email: String, result: Result<EmailAccount, ActionError>) {
        match result {
            Ok(account) => {
                self.pending.remove(&email);
                self.info(format!("Connected {}", account.email));
            }
            Err(ActionError::Backend(e)) => {
                self.pending.insert(email, AccountStatus::Error);
                self.error(e.to_string());
            }
            Err(e) => {
                self.pending.remove(&email);
                self.error(e.to_string());
            }
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind: NoticeKind::Info,
            text: text.into(),
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind: NoticeKind::Error,
            text: text.into(),
        });
    }

    pub fn accounts_model(&self) -> Option<&AccountsModel> {
        match &self.view {
            View::Accounts(s) => Some(s.model()),
            _ => None,
        }
    }

    /// Stored accounts plus local-only rows, sorted by email.
    pub fn account_rows(&self) -> Vec<AccountRow> {
        let mut rows: BTreeMap<String, AccountRow> = BTreeMap::new();
        if let Some(model) = self.accounts_model() {
            for (email, account) in &model.accounts.accounts {
                rows.insert(
                    email.clone(),
                    AccountRow {
                        email: email.clone(),
                        status: account.status,
                        account: Some(account.clone()),
                    },
                );
            }
        }
        for (email, status) in &self.pending {
            let row = rows.entry(email.clone()).or_insert_with(|| AccountRow {
                email: email.clone(),
                status: *status,
                account: None,
            });
            if *status == AccountStatus::Connecting {
                row.status = AccountStatus::Connecting;
            }
        }
        rows.into_values().collect()
    }

    pub fn selected_row(&self) -> Option<AccountRow> {
        let idx = self.list_state.selected()?;
        self.account_rows().into_iter().nth(idx)
    }

    pub fn move_selection(&mut self, delta: i32) {
        let len = self.account_rows().len() as i32;
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        let cur = self.list_state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len - 1) as usize;
        self.list_state.select(Some(next));
    }

    fn clamp_selection(&mut self) {
        if self.page == Page::Accounts {
            self.move_selection(0);
        }
    }

    pub fn move_settings_cursor(&mut self, delta: i32) {
        let len = SettingsField::ALL.len() as i32;
        self.settings_cursor = (self.settings_cursor as i32 + delta).clamp(0, len - 1) as usize;
    }

    pub fn settings_field(&self) -> SettingsField {
        SettingsField::ALL[self.settings_cursor.min(SettingsField::ALL.len() - 1)]
    }
}
