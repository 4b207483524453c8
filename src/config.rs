use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const APP_ID_VAR: &str = "WARMUP_APP_ID";
pub const STORE_CONFIG_VAR: &str = "WARMUP_STORE_CONFIG";
pub const AUTH_TOKEN_VAR: &str = "WARMUP_AUTH_TOKEN";

/// App id used when the host does not provide one.
pub const DEFAULT_APP_ID: &str = "default-app-id";

/// User preferences kept in `config.toml`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub backend_base_url: String,
    /// How often the dashboard checks the store for changes made elsewhere.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_base_url: "http://localhost:3001".to_string(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Where the documents live, as given by the hosting environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    Sqlite { path: PathBuf },
    Memory,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("WARMUP_STORE_CONFIG is not set; the dashboard has no store to connect to")]
    MissingStoreConfig,

    #[error("WARMUP_STORE_CONFIG is not valid: {0}")]
    InvalidStoreConfig(#[source] serde_json::Error),

    #[error("could not open the store: {0}")]
    StoreUnavailable(String),

    #[error("could not set up the backend client: {0}")]
    BackendClient(String),
}

/// Settings the hosting environment hands us at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    pub app_id: String,
    pub store: StoreConfig,
    pub auth_token: Option<String>,
}

impl HostEnvironment {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw = get(STORE_CONFIG_VAR).ok_or(ConfigError::MissingStoreConfig)?;
        let store = serde_json::from_str(&raw).map_err(ConfigError::InvalidStoreConfig)?;

        Ok(Self {
            app_id: get(APP_ID_VAR).unwrap_or_else(|| DEFAULT_APP_ID.to_string()),
            store,
            auth_token: get(AUTH_TOKEN_VAR),
        })
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("warmup_dash"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn log_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("warmup_dash.log");
    Ok(p)
}

/// Load `config.toml`, writing the defaults out on first run.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        let cfg = Config::default();
        fs::write(&path, toml::to_string_pretty(&cfg)?)?;
        log::info!("created default config at {}", path.display());
        return Ok(cfg);
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    fs::write(config_path()?, toml::to_string_pretty(cfg)?)?;
    Ok(())
}
