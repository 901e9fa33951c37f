//! Client context shared by the gateway and everything built on it.
//!
//! The context is the single injected object carrying the backend origin,
//! the credential store, and request tuning. There is no ambient global
//! client; every gateway is constructed from a context.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::credentials::CredentialStore;
use crate::error::ConfigError;

/// Backend origin used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Scheme prefix of the `Authorization` header.
pub const DEFAULT_AUTH_SCHEME: &str = "Token";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default confirmation poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

// ============================================================================
// Client Settings
// ============================================================================

/// Tunables for talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Backend origin, including any path prefix such as `/api`.
    pub base_url: String,
    /// Scheme written before the token in `Authorization`.
    pub auth_scheme: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Interval between confirmation polls.
    pub poll_interval: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ClientSettings {
    /// Checks that the origin is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url(&self.base_url)
    }
}

/// Checks that `url` is an absolute http(s) URL with a host.
pub fn validate_base_url(url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment"));
    }
    Ok(())
}

// ============================================================================
// Client Context
// ============================================================================

/// Everything a [`crate::host::http::Gateway`] needs.
pub struct ClientContext {
    /// The session credential.
    pub credentials: Arc<CredentialStore>,
    /// Request settings.
    pub settings: ClientSettings,
}

impl ClientContext {
    /// Creates a context with default settings and an in-memory credential.
    pub fn new() -> Self {
        Self {
            credentials: Arc::new(CredentialStore::in_memory()),
            settings: ClientSettings::default(),
        }
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> ClientContextBuilder {
        ClientContextBuilder::new()
    }

    /// Returns the backend origin.
    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// Returns the `Authorization` scheme.
    pub fn auth_scheme(&self) -> &str {
        &self.settings.auth_scheme
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    /// Returns the confirmation poll interval.
    pub fn poll_interval(&self) -> Duration {
        self.settings.poll_interval
    }
}

impl Default for ClientContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("settings", &self.settings)
            .field("credentials", &self.credentials)
            .finish()
    }
}

// ============================================================================
// Client Context Builder
// ============================================================================

/// Builder for constructing a [`ClientContext`].
#[derive(Debug, Default)]
pub struct ClientContextBuilder {
    credentials: Option<Arc<CredentialStore>>,
    settings: ClientSettings,
}

impl ClientContextBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the credential store.
    pub fn credentials(mut self, credentials: Arc<CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Replaces all settings.
    pub fn settings(mut self, settings: ClientSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the backend origin.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.settings.base_url = url.into();
        self
    }

    /// Sets the `Authorization` scheme.
    pub fn auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.settings.auth_scheme = scheme.into();
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Sets the confirmation poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.settings.poll_interval = interval;
        self
    }

    /// Builds the context, rejecting an unusable origin.
    pub fn build(self) -> Result<ClientContext, ConfigError> {
        self.settings.validate()?;

        Ok(ClientContext {
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(CredentialStore::in_memory())),
            settings: self.settings,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ClientSettings::default();
        assert_eq!(settings.base_url, "http://127.0.0.1:8000/api");
        assert_eq!(settings.auth_scheme, "Token");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.poll_interval, Duration::from_millis(3000));
    }

    #[test]
    fn test_context_builder() {
        let ctx = ClientContext::builder()
            .base_url("https://gifs.example.com/api")
            .auth_scheme("Bearer")
            .timeout(Duration::from_secs(5))
            .poll_interval(Duration::from_secs(1))
            .build()
            .unwrap();

        assert_eq!(ctx.base_url(), "https://gifs.example.com/api");
        assert_eq!(ctx.auth_scheme(), "Bearer");
        assert_eq!(ctx.timeout(), Duration::from_secs(5));
        assert_eq!(ctx.poll_interval(), Duration::from_secs(1));
        assert!(!ctx.credentials.is_present());
    }

    #[test]
    fn test_builder_rejects_bad_origin() {
        for url in ["not a url", "ftp://example.com", "http://x/api?debug=1"] {
            let result = ClientContext::builder().base_url(url).build();
            assert!(
                matches!(result, Err(ConfigError::InvalidBaseUrl { .. })),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_builder_shares_credentials() {
        let credentials = Arc::new(CredentialStore::in_memory());
        let ctx = ClientContext::builder()
            .credentials(credentials.clone())
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(&ctx.credentials, &credentials));
    }
}
