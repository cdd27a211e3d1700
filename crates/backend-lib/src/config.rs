// ============================
// postgate-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use zeroize::Zeroize;

/// Environment variable prefix for every setting
pub const ENV_PREFIX: &str = "POSTGATE_";

/// Config file read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Directory holding the user and post logs
    pub data_dir: PathBuf,
    /// Log level, overridden by `RUST_LOG`
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// The single origin allowed by CORS
    pub allowed_origin: String,
    /// Shared secret used to sign bearer tokens
    pub jwt_secret: JwtSecret,
    /// Token lifetime. `None` issues tokens without an `exp` claim.
    pub token_ttl_secs: Option<u64>,
    /// scrypt cost parameters
    pub password_hashing: HashingSettings,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// scrypt cost parameters used for new password hashes.
///
/// Existing hashes carry their own parameters, so changing these only
/// affects accounts registered afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HashingSettings {
    /// log2 of the CPU/memory cost
    pub log_n: u8,
    /// Block size
    pub r: u32,
    /// Parallelization
    pub p: u32,
}

/// Token signing secret. Redacted in `Debug` output and wiped on drop.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct JwtSecret(String);

impl JwtSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtSecret([redacted])")
    }
}

impl Drop for JwtSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            allowed_origin: "https://my-social-app.pages.dev".to_string(),
            jwt_secret: JwtSecret::default(),
            token_ttl_secs: None,
            password_hashing: HashingSettings::default(),
        }
    }
}

impl Default for HashingSettings {
    fn default() -> Self {
        Self {
            log_n: 15,
            r: 8,
            p: 1,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from the given TOML file (if it exists), then the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings: Settings = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("failed to load settings from {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings for values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }

        if self.jwt_secret.is_empty() {
            bail!("jwt_secret must be set (env {ENV_PREFIX}JWT_SECRET)");
        }

        if self.allowed_origin.is_empty() || HeaderValue::from_str(&self.allowed_origin).is_err() {
            bail!("invalid allowed_origin: {:?}", self.allowed_origin);
        }

        if self.token_ttl_secs == Some(0) {
            bail!("token_ttl_secs must be greater than zero when set");
        }

        self.password_hashing
            .to_params()
            .context("invalid password_hashing parameters")?;

        Ok(())
    }

    /// Builder for tests and embedding
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }
}

impl HashingSettings {
    /// Convert into scrypt parameters
    pub fn to_params(&self) -> Result<scrypt::Params, scrypt::errors::InvalidParams> {
        scrypt::Params::new(self.log_n, self.r, self.p, scrypt::Params::RECOMMENDED_LEN)
    }
}

/// Builder for [`Settings`]
#[derive(Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.settings.bind_addr = addr;
        self
    }

    pub fn data_dir(mut self, dir: PathBuf) -> Self {
        self.settings.data_dir = dir;
        self
    }

    pub fn log_level(mut self, level: String) -> Self {
        self.settings.log_level = level;
        self
    }

    pub fn allowed_origin(mut self, origin: String) -> Self {
        self.settings.allowed_origin = origin;
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.settings.jwt_secret = JwtSecret::new(secret);
        self
    }

    pub fn token_ttl(mut self, secs: u64) -> Self {
        self.settings.token_ttl_secs = Some(secs);
        self
    }

    pub fn password_hashing(mut self, hashing: HashingSettings) -> Self {
        self.settings.password_hashing = hashing;
        self
    }

    /// Validate and return the settings
    pub fn build(self) -> Result<Settings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}
