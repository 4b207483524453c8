use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use crate::actions::AccountService;
use crate::auth::{IdentityGate, resolve_identity, token_store};
use crate::backend::HttpBackend;
use crate::config::{Config, ConfigError, HostEnvironment};
use crate::event::AppEvent;
use crate::store::{AuthProvider, RemoteStore, Scope, StoreHandles, open_store};

/// Collaborators shared by every part of the dashboard. Built once at
/// startup and passed around; never rebuilt during a session.
pub struct AppContext {
    pub env: HostEnvironment,
    pub config: Config,
    pub store: Arc<dyn RemoteStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub backend: Arc<HttpBackend>,
    pub accounts: Arc<AccountService>,
    pub identity: IdentityGate,
}

impl AppContext {
    pub fn bootstrap(env: HostEnvironment, config: Config) -> Result<Self, ConfigError> {
        let handles =
            open_store(&env.store).map_err(|e| ConfigError::StoreUnavailable(e.to_string()))?;
        Self::with_store(env, config, handles)
    }

    pub fn with_store(
        env: HostEnvironment,
        config: Config,
        handles: StoreHandles,
    ) -> Result<Self, ConfigError> {
        let backend = Arc::new(
            HttpBackend::new(config.backend_base_url.clone())
                .map_err(|e| ConfigError::BackendClient(e.to_string()))?,
        );
        let accounts = Arc::new(AccountService::new(handles.store.clone(), backend.clone()));
        Ok(Self {
            env,
            config,
            store: handles.store,
            auth: handles.auth,
            backend,
            accounts,
            identity: IdentityGate::new(),
        })
    }

    /// Scope of the signed-in user, once the identity is ready.
    pub fn scope(&self) -> Option<Scope> {
        self.identity
            .get()
            .map(|id| Scope::new(&self.env.app_id, &id.uid))
    }

    /// Token from the environment, falling back to the one saved in the
    /// keyring.
    pub fn auth_token(&self) -> Option<String> {
        if let Some(t) = &self.env.auth_token {
            return Some(t.clone());
        }
        match token_store::load_auth_token(&self.env.app_id) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("could not read saved token: {e}");
                None
            }
        }
    }

    /// Sign in on a worker thread; the result arrives as
    /// [`AppEvent::IdentityReady`].
    pub fn start_sign_in(&self, tx: Sender<AppEvent>) {
        let auth = self.auth.clone();
        let token = self.auth_token();
        thread::spawn(move || {
            let identity = resolve_identity(auth.as_ref(), token.as_deref());
            let _ = tx.send(AppEvent::IdentityReady(identity));
        });
    }
}
