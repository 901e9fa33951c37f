//! Fetch error types.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Message shown when a failure carries no interpretable text.
pub const GENERIC_ERROR_MESSAGE: &str = "The request failed. Please try again later.";

// ============================================================================
// Normalized API Error
// ============================================================================

/// Which failure surface produced an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No usable response: DNS, connection, timeout, abort, or a malformed body.
    Network,
    /// A response arrived with a status outside the success range.
    Http,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "NETWORK"),
            Self::Http => write!(f, "HTTP"),
        }
    }
}

/// The single error shape produced by the transport gateway.
///
/// Every failure observed above the gateway has this shape. `payload` keeps
/// the backend's error document verbatim so callers can branch on it:
///
/// - `{"field": ["msg", ...]}` for validation errors
/// - `{"detail": "msg"}` for authentication errors
/// - `{"error": "msg"}` for domain-rule errors (quota, already subscribed)
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// Failure surface.
    pub kind: ErrorKind,
    /// HTTP status, present only for [`ErrorKind::Http`].
    pub status: Option<u16>,
    /// Parsed error body, if the response had one.
    pub payload: Option<Value>,
    /// Diagnostic message.
    pub message: String,
}

impl ApiError {
    /// Creates a transport-level error.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Network,
            status: None,
            payload: None,
            message: message.into(),
        }
    }

    /// Creates an error for a body that could not be parsed or decoded.
    pub fn malformed(detail: impl std::fmt::Display) -> Self {
        Self::network(format!("Malformed response body: {detail}"))
    }

    /// Creates an application-level error from a status and parsed body.
    pub fn http(status: u16, payload: Option<Value>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown status");
        let message = match payload.as_ref().and_then(extract_text) {
            Some(text) => format!("HTTP {status} {reason}: {text}"),
            None => format!("HTTP {status} {reason}"),
        };

        Self {
            kind: ErrorKind::Http,
            status: Some(status),
            payload,
            message,
        }
    }

    /// Returns true for transport-level failures.
    pub fn is_network(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    /// Returns true if the backend answered with the given status.
    pub fn has_status(&self, status: u16) -> bool {
        self.kind == ErrorKind::Http && self.status == Some(status)
    }

    /// Returns true for a 404 response.
    pub fn is_not_found(&self) -> bool {
        self.has_status(404)
    }

    /// Returns true if the error means the session credential is invalid.
    ///
    /// That is any 401, or a 403 without a structured payload. A 403 that
    /// carries an object (`error` or `detail`) is a plan or permission
    /// refusal of a valid session.
    pub fn is_auth_failure(&self) -> bool {
        if self.kind != ErrorKind::Http {
            return false;
        }
        match self.status {
            Some(401) => true,
            Some(403) => !matches!(self.payload, Some(Value::Object(_))),
            _ => false,
        }
    }

    /// Returns a string member of the payload object.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.as_ref()?.get(key)?.as_str()
    }

    /// Returns the most specific human-readable text carried by the payload.
    ///
    /// Looks at `error`, then `detail`, then `non_field_errors`, then the
    /// first field-level message.
    pub fn error_text(&self) -> Option<String> {
        self.payload.as_ref().and_then(extract_text)
    }

    /// Returns field-level validation messages keyed by field name.
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        let Some(Value::Object(map)) = &self.payload else {
            return BTreeMap::new();
        };

        map.iter()
            .filter_map(|(field, value)| {
                let messages = string_list(value)?;
                (!messages.is_empty()).then(|| (field.clone(), messages))
            })
            .collect()
    }

    /// Returns a message suitable for showing to the user.
    ///
    /// Never empty: falls back to [`GENERIC_ERROR_MESSAGE`] when the payload
    /// has nothing interpretable.
    pub fn user_message(&self) -> String {
        if let Some(text) = self.error_text() {
            return text;
        }
        match self.kind {
            ErrorKind::Network if !self.message.is_empty() => {
                format!("Could not reach the server ({})", self.message)
            }
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("Request timed out: {err}"))
        } else if err.is_decode() {
            Self::malformed(err)
        } else {
            Self::network(err.to_string())
        }
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

fn extract_text(payload: &Value) -> Option<String> {
    let map = match payload {
        Value::String(s) if !s.trim().is_empty() => return Some(s.clone()),
        Value::Object(map) => map,
        _ => return None,
    };

    for key in ["error", "detail"] {
        if let Some(text) = map.get(key).and_then(Value::as_str) {
            if !text.trim().is_empty() {
                return Some(text.to_string());
            }
        }
    }

    if let Some(first) = map
        .get("non_field_errors")
        .and_then(string_list)
        .and_then(|list| list.into_iter().next())
    {
        return Some(first);
    }

    map.iter().find_map(|(field, value)| {
        let first = string_list(value)?.into_iter().next()?;
        Some(format!("{field}: {first}"))
    })
}

// ============================================================================
// Credential Error
// ============================================================================

/// Error persisting or loading the session credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// System keychain failure.
    #[error("Keychain error: {0}")]
    Keychain(String),

    /// Access to the keychain was denied.
    #[error("Access denied to keychain")]
    AccessDenied,

    /// File or other storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<keyring::Error> for CredentialError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoStorageAccess(_) => CredentialError::AccessDenied,
            keyring::Error::PlatformFailure(e) => CredentialError::Keychain(e.to_string()),
            _ => CredentialError::Keychain(err.to_string()),
        }
    }
}

// ============================================================================
// Session Error
// ============================================================================

/// Error from a sign-in or sign-up flow.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The token was accepted but could not be persisted.
    #[error("Failed to persist session: {0}")]
    Credential(#[from] CredentialError),
}

// ============================================================================
// Profile Error
// ============================================================================

/// Error assembling the profile view.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The mandatory identity fetch failed; treat the user as signed out.
    #[error("Not authenticated: {0}")]
    Unauthenticated(#[source] ApiError),
}

// ============================================================================
// Config Error
// ============================================================================

/// Error building the client context or gateway.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured base address is not a usable URL.
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

// ============================================================================
// Tests
// ============================================================================
