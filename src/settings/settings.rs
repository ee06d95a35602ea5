use anyhow::{Result, anyhow, bail};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub credential: Credential,
    pub revocation: Revocation,
    pub http: Http,
    pub log: Log,
}

/// Token options. Every field is required; a missing one fails startup.
#[derive(Deserialize)]
pub struct Auth {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_lifetime_secs: u64,
    pub refresh_lifetime_secs: u64,
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_lifetime_secs", &self.access_lifetime_secs)
            .field("refresh_lifetime_secs", &self.refresh_lifetime_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Credential {
    pub backend: String, // "memory" or "mysql"
    pub mysql_dsn: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Revocation {
    pub backend: String, // "memory" or "redis"
    pub redis_dsn: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_key_prefix() -> String {
    "auth:refresh".to_string()
}

fn default_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Environment variables override the file, e.g.
/// `TOKENWARDEN__AUTH__ACCESS_SECRET`.
pub const ENV_PREFIX: &str = "TOKENWARDEN";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}

/// Ten years. Anything longer cannot be represented as a token expiry.
pub const MAX_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let auth = &self.auth;
        if auth.access_secret.is_empty() || auth.refresh_secret.is_empty() {
            bail!("auth secrets must not be empty");
        }
        if auth.access_secret == auth.refresh_secret {
            bail!("access and refresh secrets must differ");
        }
        if auth.access_lifetime_secs == 0 || auth.refresh_lifetime_secs == 0 {
            bail!("token lifetimes must be positive");
        }
        if auth.refresh_lifetime_secs > MAX_LIFETIME_SECS {
            bail!(
                "token lifetimes must not exceed {} seconds",
                MAX_LIFETIME_SECS
            );
        }
        if auth.access_lifetime_secs > auth.refresh_lifetime_secs {
            bail!("access lifetime must not exceed refresh lifetime");
        }
        match self.credential.backend.as_str() {
            "memory" => {}
            "mysql" if self.credential.mysql_dsn.is_some() => {}
            "mysql" => bail!("credential.mysql_dsn is required for the mysql backend"),
            other => bail!("unknown credential backend: {}", other),
        }
        match self.revocation.backend.as_str() {
            "memory" => {}
            "redis" if self.revocation.redis_dsn.is_some() => {}
            "redis" => bail!("revocation.redis_dsn is required for the redis backend"),
            other => bail!("unknown revocation backend: {}", other),
        }
        if self.revocation.timeout_ms == 0 {
            bail!("revocation.timeout_ms must be positive");
        }
        if self.http.cert_path.is_some() != self.http.key_path.is_some() {
            bail!("http.cert_path and http.key_path must be set together");
        }
        Ok(())
    }
}
