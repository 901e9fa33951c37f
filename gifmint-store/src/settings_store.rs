//! User preferences store.
//!
//! Settings are layered: built-in defaults, then the settings file, then the
//! `GIFMINT_API_URL` environment variable or `--api-url` flag for the origin.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use gifmint_fetch::context::{DEFAULT_AUTH_SCHEME, DEFAULT_BASE_URL};
use gifmint_fetch::{ClientSettings, validate_base_url};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend origin.
    pub api_url: String,

    /// `Authorization` scheme.
    pub auth_scheme: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Confirmation poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Where the session token is kept.
    pub credential_backend: CredentialBackend,

    /// Log level used when neither `-v` nor `-q` is given.
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            request_timeout_secs: 30,
            poll_interval_ms: 3000,
            credential_backend: CredentialBackend::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Returns the confirmation poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Builds client settings, letting `api_url_override` win over the file.
    pub fn client_settings(&self, api_url_override: Option<&str>) -> ClientSettings {
        let base_url = api_url_override
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(&self.api_url);

        ClientSettings {
            base_url: base_url.to_string(),
            auth_scheme: self.auth_scheme.clone(),
            timeout: self.request_timeout(),
            poll_interval: self.poll_interval(),
        }
    }

    /// Checks the settings for values the client cannot use.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_base_url(&self.api_url).map_err(|e| StoreError::Config(e.to_string()))?;
        if self.auth_scheme.trim().is_empty() {
            return Err(StoreError::Config("auth_scheme must not be empty".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(StoreError::Config(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the session token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialBackend {
    /// `session.json` in the config directory.
    #[default]
    File,
    /// The system keychain.
    Keychain,
}

impl std::fmt::Display for CredentialBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialBackend::File => write!(f, "file"),
            CredentialBackend::Keychain => write!(f, "keychain"),
        }
    }
}

impl std::str::FromStr for CredentialBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keychain" => Ok(Self::Keychain),
            other => Err(StoreError::Config(format!(
                "unknown credential backend '{other}' (expected file or keychain)"
            ))),
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store with default settings at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            settings: Arc::new(RwLock::new(Settings::default())),
            path,
        }
    }

    /// Loads settings from the default path.
    pub async fn load_default() -> Self {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// A missing or unreadable file yields defaults.
    pub async fn load(path: PathBuf) -> Self {
        let settings = match load_json::<Settings>(&path).await {
            Ok(settings) => {
                info!(path = %path.display(), "Loaded settings");
                settings
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "Settings file not found, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load settings, using defaults");
                Settings::default()
            }
        };

        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        }
    }

    /// Returns the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Applies `f` to the settings, rejecting the change if the result is invalid.
    pub async fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        let mut candidate = settings.clone();
        f(&mut candidate);
        candidate.validate()?;
        *settings = candidate;
        Ok(())
    }

    /// Restores defaults.
    pub async fn reset(&self) {
        *self.settings.write().await = Settings::default();
    }

    /// Saves settings to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
