use serde::{Deserialize, Serialize};

/// How many log entries the dashboard keeps.
pub const RECENT_LOG_LIMIT: usize = 10;

/// Field used to order log entries, newest first.
pub const LOG_ORDER_FIELD: &str = "timestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    /// Epoch millis.
    pub timestamp: i64,
    pub event: String,
    pub email: String,
    pub status: LogStatus,
}

impl LogEntry {
    /// Entries are keyed by their timestamp.
    pub fn new(timestamp: i64, event: &str, email: &str, status: LogStatus) -> Self {
        Self {
            id: timestamp.to_string(),
            timestamp,
            event: event.to_string(),
            email: email.to_string(),
            status,
        }
    }
}
