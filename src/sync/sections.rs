//! The three views of the dashboard and how snapshots map onto them.

use crate::domain::account::{ACCOUNTS_FIELD, AccountList, EmailAccount};
use crate::domain::log::{LOG_ORDER_FIELD, LogEntry, RECENT_LOG_LIMIT};
use crate::domain::settings::WarmupSettings;
use crate::domain::stats::DashboardStats;
use crate::store::{Document, Scope, Snapshot};

use super::{Binding, OrderPolicy, SectionId, SectionModel, from_document, to_document};

fn default_doc<T: serde::Serialize>(value: &T) -> Option<Document> {
    match to_document(value) {
        Ok(doc) => Some(doc),
        Err(e) => {
            log::error!("could not encode default document: {e}");
            None
        }
    }
}

fn unexpected(section: SectionId, binding: usize, snapshot: &Snapshot) {
    log::warn!("{section:?}: unexpected snapshot for binding {binding}: {snapshot:?}");
}

/// Stats card plus the recent activity feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardModel {
    pub stats: DashboardStats,
    /// Newest first, at most [`RECENT_LOG_LIMIT`].
    pub logs: Vec<LogEntry>,
}

impl DashboardModel {
    pub const STATS: usize = 0;
    pub const LOGS: usize = 1;
}

impl SectionModel for DashboardModel {
    const SECTION: SectionId = SectionId::Dashboard;

    fn bindings(scope: &Scope) -> Vec<Binding> {
        vec![
            Binding::Singleton {
                path: scope.stats(),
                default: default_doc(&DashboardStats::default()),
            },
            Binding::List {
                path: scope.logs(),
                order: Some(OrderPolicy::newest_first(LOG_ORDER_FIELD, RECENT_LOG_LIMIT)),
            },
        ]
    }

    fn apply(&mut self, binding: usize, snapshot: Snapshot) {
        match (binding, snapshot) {
            (Self::STATS, Snapshot::Document(doc)) => {
                let Some(doc) = doc else {
                    self.stats = DashboardStats::default();
                    return;
                };
                match from_document(doc) {
                    Ok(stats) => self.stats = stats,
                    Err(e) => log::warn!("ignoring malformed stats document: {e}"),
                }
            }
            (Self::LOGS, Snapshot::Collection(entries)) => {
                self.logs = entries
                    .into_iter()
                    .filter_map(|entry| match from_document::<LogEntry>(entry.data) {
                        Ok(log) => Some(log),
                        Err(e) => {
                            log::warn!("skipping malformed log entry {}: {e}", entry.id);
                            None
                        }
                    })
                    .collect();
            }
            (b, s) => unexpected(Self::SECTION, b, &s),
        }
    }
}

/// The user's connected accounts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountsModel {
    pub accounts: AccountList,
}

impl AccountsModel {
    pub const LIST: usize = 0;

    fn decode(doc: Document) -> AccountList {
        let mut list = AccountList::default();
        let Some(serde_json::Value::Object(entries)) = doc.get(ACCOUNTS_FIELD).cloned() else {
            return list;
        };
        for (email, value) in entries {
            match serde_json::from_value::<EmailAccount>(value) {
                Ok(account) => {
                    list.accounts.insert(email, account);
                }
                Err(e) => log::warn!("skipping malformed account {email}: {e}"),
            }
        }
        list
    }
}

impl SectionModel for AccountsModel {
    const SECTION: SectionId = SectionId::Accounts;

    fn bindings(scope: &Scope) -> Vec<Binding> {
        vec![Binding::Singleton {
            path: scope.account_list(),
            default: None,
        }]
    }

    fn apply(&mut self, binding: usize, snapshot: Snapshot) {
        match (binding, snapshot) {
            (Self::LIST, Snapshot::Document(doc)) => {
                self.accounts = doc.map(Self::decode).unwrap_or_default();
            }
            (b, s) => unexpected(Self::SECTION, b, &s),
        }
    }
}

/// Warmup configuration being edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsModel {
    pub settings: WarmupSettings,
}

impl SettingsModel {
    pub const SETTINGS: usize = 0;
}

impl SectionModel for SettingsModel {
    const SECTION: SectionId = SectionId::Settings;

    fn bindings(scope: &Scope) -> Vec<Binding> {
        vec![Binding::Singleton {
            path: scope.warmup_settings(),
            default: default_doc(&WarmupSettings::default()),
        }]
    }

    fn apply(&mut self, binding: usize, snapshot: Snapshot) {
        match (binding, snapshot) {
            (Self::SETTINGS, Snapshot::Document(Some(doc))) => match from_document(doc) {
                Ok(settings) => self.settings = settings,
                Err(e) => log::warn!("ignoring malformed settings document: {e}"),
            },
            (Self::SETTINGS, Snapshot::Document(None)) => {
                self.settings = WarmupSettings::default();
            }
            (b, s) => unexpected(Self::SECTION, b, &s),
        }
    }
}
