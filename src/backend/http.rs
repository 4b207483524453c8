use std::sync::{PoisonError, RwLock};

use reqwest::blocking::Client;
use url::Url;

use super::{
    AccountSummary, BackendError, CONNECT_PATH, ConnectRequest, ConnectResponse,
    GENERIC_TRANSPORT_ERROR, WarmupBackend, interpret_response,
};

/// Talks to the backend at a base URL the user can change while running.
pub struct HttpBackend {
    client: Client,
    base_url: RwLock<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        // The backend call has no deadline of its own.
        let client = Client::builder()
            .timeout(None::<std::time::Duration>)
            .build()?;
        Ok(Self {
            client,
            base_url: RwLock::new(base_url.into()),
        })
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_base_url(&self, base_url: impl Into<String>) {
        *self.base_url.write().unwrap_or_else(PoisonError::into_inner) = base_url.into();
    }

    fn endpoint(&self) -> Result<Url, BackendError> {
        let base = self.base_url();
        let joined = format!("{}{}", base.trim_end_matches('/'), CONNECT_PATH);
        Url::parse(&joined).map_err(|e| {
            log::warn!("invalid backend url '{base}': {e}");
            BackendError::Transport(GENERIC_TRANSPORT_ERROR.to_string())
        })
    }
}

impl WarmupBackend for HttpBackend {
    fn connect(&self, request: &ConnectRequest) -> Result<AccountSummary, BackendError> {
        let url = self.endpoint()?;
        log::debug!("POST {url} for {}", request.email);

        let resp = match self.client.post(url).json(request).send() {
            Ok(r) => r,
            Err(e) => {
                log::warn!("backend connect for {} failed: {e}", request.email);
                return Err(BackendError::Transport(GENERIC_TRANSPORT_ERROR.to_string()));
            }
        };

        let status = resp.status();
        let body = resp.json::<ConnectResponse>().ok();
        if !status.is_success() {
            log::warn!("backend answered {status} for {}", request.email);
        }
        interpret_response(request, status.is_success(), body)
    }
}
