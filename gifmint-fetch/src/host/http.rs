//! The transport gateway.
//!
//! Every backend request goes through [`Gateway::execute`]. It:
//! - resolves the path against the configured origin
//! - attaches the current credential when one is held
//! - sends and receives JSON
//! - maps every failure to a single [`ApiError`] shape
//!
//! The gateway never retries and never decides authorization locally. A
//! request marked as requiring auth is still sent without a credential and
//! the server's answer is surfaced unchanged.

use std::sync::Arc;

use reqwest::{Client, Method, header};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::context::ClientContext;
use crate::error::{ApiError, ConfigError};

/// User agent string for gifmint.
const USER_AGENT: &str = concat!("gifmint/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Request Descriptor
// ============================================================================

/// What to send: path relative to the origin, method, body, auth flag.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the origin, e.g. `/users/login/`.
    pub path: String,
    /// JSON body.
    pub body: Option<Value>,
    /// Whether the endpoint expects a credential.
    pub requires_auth: bool,
}

impl RequestDescriptor {
    /// Creates a descriptor with no body that does not require auth.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            requires_auth: false,
        }
    }

    /// A GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// A POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Marks the request as requiring a credential.
    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Attaches a JSON body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes and attaches a body.
    pub fn with_body<T: Serialize>(self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::network(format!("Failed to encode request body: {e}")))?;
        Ok(self.with_json(value))
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Sends requests to the backend and normalizes every outcome.
#[derive(Debug, Clone)]
pub struct Gateway {
    inner: Client,
    context: Arc<ClientContext>,
}

impl Gateway {
    /// Creates a gateway from a context.
    pub fn new(context: Arc<ClientContext>) -> Result<Self, ConfigError> {
        context.settings.validate()?;

        let inner = Client::builder()
            .timeout(context.timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { inner, context })
    }

    /// Returns the context this gateway was built from.
    pub fn context(&self) -> &Arc<ClientContext> {
        &self.context
    }

    /// Resolves a path against the configured origin.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.context.base_url().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    /// Performs a request and returns the parsed success body.
    ///
    /// An empty success body yields `Value::Null`. Errors:
    /// - [`ApiError::network`] when no usable response arrived, including a
    ///   success body that is not JSON
    /// - [`ApiError::http`] for any non-2xx status, carrying the parsed error
    ///   body (or `None` when it is empty or not JSON)
    #[instrument(skip(self, descriptor), fields(method = %descriptor.method, path = %descriptor.path))]
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Value, ApiError> {
        let url = self.url_for(&descriptor.path);

        let mut request = self
            .inner
            .request(descriptor.method.clone(), &url)
            .header(header::ACCEPT, "application/json");

        // Snapshot at dispatch; a credential changed mid-flight is picked up
        // by the next request.
        match self.context.credentials.get() {
            Some(token) => {
                let value = format!("{} {}", self.context.auth_scheme(), token);
                request = request.header(header::AUTHORIZATION, value);
            }
            None if descriptor.requires_auth => {
                debug!("No credential held, sending unauthenticated");
            }
            None => {}
        }

        if let Some(body) = &descriptor.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Request failed before a response arrived");
            ApiError::from(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            warn!(status = %status, error = %e, "Failed to read response body");
            ApiError::from(e)
        })?;

        debug!(status = %status, bytes = bytes.len(), "Response received");

        if status.is_success() {
            parse_success_body(&bytes)
        } else {
            let error = ApiError::http(status.as_u16(), parse_error_body(&bytes));
            debug!(status = %status, error = %error, "Backend returned an error");
            Err(error)
        }
    }
}

fn parse_success_body(bytes: &[u8]) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| {
        warn!(error = %e, "Success response is not valid JSON");
        ApiError::malformed(e)
    })
}

fn parse_error_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(bytes).ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base_url: &str) -> Gateway {
        let ctx = ClientContext::builder().base_url(base_url).build().unwrap();
        Gateway::new(Arc::new(ctx)).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let gw = gateway("http://127.0.0.1:8000/api");
        assert_eq!(gw.url_for("/plans/"), "http://127.0.0.1:8000/api/plans/");
        assert_eq!(gw.url_for("plans/"), "http://127.0.0.1:8000/api/plans/");

        let gw = gateway("http://127.0.0.1:8000/api/");
        assert_eq!(gw.url_for("/plans/"), "http://127.0.0.1:8000/api/plans/");
    }

    #[test]
    fn test_descriptor_builders() {
        let d = RequestDescriptor::post("/gifs/generate/")
            .authenticated()
            .with_json(serde_json::json!({"prompt": "x"}));

        assert_eq!(d.method, Method::POST);
        assert!(d.requires_auth);
        assert!(d.body.is_some());
        assert!(!RequestDescriptor::get("/plans/").requires_auth);
    }

    #[test]
    fn test_body_parsing() {
        assert_eq!(parse_success_body(b"").unwrap(), Value::Null);
        assert_eq!(parse_success_body(b"  \n").unwrap(), Value::Null);
        assert!(parse_success_body(b"<html>").unwrap_err().is_network());

        assert_eq!(parse_error_body(b""), None);
        assert_eq!(parse_error_body(b"Internal Server Error"), None);
        assert_eq!(
            parse_error_body(br#"{"detail":"x"}"#),
            Some(serde_json::json!({"detail": "x"}))
        );
    }
}
