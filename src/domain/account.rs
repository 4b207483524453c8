use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Connecting,
    Active,
    Paused,
    Error,
}

impl AccountStatus {
    pub fn label(self) -> &'static str {
        match self {
            AccountStatus::Connecting => "Connecting",
            AccountStatus::Active => "Active",
            AccountStatus::Paused => "Paused",
            AccountStatus::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAccount {
    pub email: String,
    pub status: AccountStatus,
    #[serde(default)]
    pub sent_count: u64,
    #[serde(default)]
    pub received_count: u64,
    /// Epoch millis of the last successful connect.
    #[serde(default)]
    pub last_connected: i64,
}

/// Field of the list document that holds the account map.
pub const ACCOUNTS_FIELD: &str = "accounts";

/// The user's accounts keyed by email. Backed by a single document so a
/// repeated connect overwrites an entry instead of adding a second one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountList {
    #[serde(default)]
    pub accounts: BTreeMap<String, EmailAccount>,
}

impl AccountList {
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, email: &str) -> Option<&EmailAccount> {
        self.accounts.get(email)
    }

    pub fn contains(&self, email: &str) -> bool {
        self.accounts.contains_key(email)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmailAccount> {
        self.accounts.values()
    }

    /// Copy of the list with `email` filtered out.
    pub fn without(&self, email: &str) -> AccountList {
        AccountList {
            accounts: self
                .accounts
                .iter()
                .filter(|(k, _)| k.as_str() != email)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}
