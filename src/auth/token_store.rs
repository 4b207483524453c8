use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

const SERVICE: &str = "warmup_dash";

/// Save the sign-in token for `app_id` into the OS keyring
pub fn save_auth_token(app_id: &str, token: &str) -> Result<()> {
    let entry = Entry::new(SERVICE, app_id);
    entry?
        .set_password(token)
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

/// Load the sign-in token for `app_id` from the keyring
pub fn load_auth_token(app_id: &str) -> Result<Option<String>> {
    let entry = Entry::new(SERVICE, app_id);
    match entry?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}
