use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub directory: Directory,
    pub http: Http,
    pub log: Log,
    pub store: Store,
}

#[derive(Deserialize)]
pub struct Auth {
    pub backend: String, // "fake" or "real"
    pub signing_key: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("backend", &self.backend)
            .field("signing_key", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Directory {
    pub backend: String, // "mysql" or "memory"
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
    pub request_timeout_ms: u64,
    /// Value the gateway sends in `X-Internal-Service` on administrative calls.
    pub internal_service: String,
}

impl Http {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "redis" or "memory"
    pub url: String,
    pub connection_timeout_ms: u64,
    pub response_timeout_ms: u64,
    pub retries: usize,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Environment overrides, e.g. `USER_SESSION__AUTH__SIGNING_KEY`.
const ENV_PREFIX: &str = "USER_SESSION";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .set_default("auth.backend", "real")?
        .set_default("auth.access_ttl_secs", 15 * 60)?
        .set_default("auth.refresh_ttl_secs", 720 * 60 * 60)?
        .set_default("http.request_timeout_ms", 5_000)?
        .set_default("http.internal_service", "kong-auth")?
        .set_default("store.connection_timeout_ms", 10_000)?
        .set_default("store.response_timeout_ms", 3_000)?
        .set_default("store.retries", 3)?
        .set_default("directory.max_connections", 10)?
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
