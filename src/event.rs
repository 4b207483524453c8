use std::sync::Arc;
use std::sync::mpsc::Sender;

use crate::actions::ActionError;
use crate::auth::Identity;
use crate::domain::account::EmailAccount;
use crate::sync::{EventSink, SyncEvent};

/// Everything that reaches the UI thread from elsewhere.
#[derive(Debug)]
pub enum AppEvent {
    IdentityReady(Identity),
    Sync(SyncEvent),
    ConnectFinished {
        email: String,
        result: Result<EmailAccount, ActionError>,
    },
}

/// Sink that forwards subscription events into the app queue.
pub fn sync_sink(tx: Sender<AppEvent>) -> EventSink {
    Arc::new(move |event| {
        // The receiver only goes away on shutdown.
        let _ = tx.send(AppEvent::Sync(event));
    })
}
