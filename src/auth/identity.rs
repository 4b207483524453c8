use std::sync::OnceLock;

use crate::store::{AuthProvider, StoreError, is_valid_uid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOrigin {
    /// Signed in with a custom token.
    Token,
    Anonymous,
    /// Sign-in failed; a random local id keeps the dashboard usable but
    /// nothing written under it is found again next session.
    LocalFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub origin: IdentityOrigin,
}

impl Identity {
    pub fn is_persistent(&self) -> bool {
        self.origin != IdentityOrigin::LocalFallback
    }
}

/// Sign in with `token` when given, anonymously otherwise. Never fails:
/// auth problems degrade to a local random identity.
pub fn resolve_identity(auth: &dyn AuthProvider, token: Option<&str>) -> Identity {
    let (attempt, origin) = match token {
        Some(t) => (auth.sign_in_with_token(t), IdentityOrigin::Token),
        None => (auth.sign_in_anonymously(), IdentityOrigin::Anonymous),
    };
    let attempt = attempt.and_then(|uid| {
        if is_valid_uid(&uid) {
            Ok(uid)
        } else {
            Err(StoreError::Auth(format!("unusable user id '{uid}'")))
        }
    });
    match attempt {
        Ok(uid) => {
            log::info!("signed in as {uid} ({origin:?})");
            Identity { uid, origin }
        }
        Err(e) => {
            let uid = format!("local-{}", uuid::Uuid::new_v4());
            log::warn!("sign-in failed ({e}); continuing as {uid}, data will not persist");
            Identity {
                uid,
                origin: IdentityOrigin::LocalFallback,
            }
        }
    }
}

/// The session's ready signal. Goes from not-ready to ready once and
/// never changes afterwards.
#[derive(Debug, Default)]
pub struct IdentityGate {
    cell: OnceLock<Identity>,
}

impl IdentityGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the call that made the gate ready.
    pub fn mark_ready(&self, identity: Identity) -> bool {
        self.cell.set(identity).is_ok()
    }

    pub fn get(&self) -> Option<&Identity> {
        self.cell.get()
    }

    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }
}
