//! Client for the warmup backend's account-connect endpoint.

pub mod http;

use serde::{Deserialize, Serialize};

pub use http::HttpBackend;

pub const CONNECT_PATH: &str = "/api/emails/connect";

/// Reason shown when the backend gave no message of its own.
pub const GENERIC_TRANSPORT_ERROR: &str =
    "Could not reach the warmup backend. Check the backend URL and try again.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub email: String,
    pub password: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub email: String,
    #[serde(default)]
    pub sent_count: u64,
    #[serde(default)]
    pub received_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub account: Option<AccountSummary>,
}

/// Why a connect failed. Displays as the human readable reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend answered and said no.
    #[error("{0}")]
    Rejected(String),
    /// No usable answer at all.
    #[error("{0}")]
    Transport(String),
}

pub trait WarmupBackend: Send + Sync {
    /// One attempt, no retries.
    fn connect(&self, request: &ConnectRequest) -> Result<AccountSummary, BackendError>;
}

/// Decide the outcome from the HTTP status and the (possibly unparsable)
/// body. Success needs both a 2xx status and `success: true`.
pub fn interpret_response(
    request: &ConnectRequest,
    status_ok: bool,
    body: Option<ConnectResponse>,
) -> Result<AccountSummary, BackendError> {
    match body {
        Some(resp) if status_ok && resp.success => Ok(resp.account.unwrap_or_else(|| {
            AccountSummary {
                email: request.email.clone(),
                sent_count: 0,
                received_count: 0,
            }
        })),
        Some(ConnectResponse {
            message: Some(m), ..
        }) if !m.trim().is_empty() => Err(BackendError::Rejected(m)),
        Some(_) if status_ok => Err(BackendError::Rejected(GENERIC_TRANSPORT_ERROR.to_string())),
        _ => Err(BackendError::Transport(GENERIC_TRANSPORT_ERROR.to_string())),
    }
}
