//! Account types.

use serde::{Deserialize, Serialize};

// ============================================================================
// User Profile
// ============================================================================

/// The authenticated user, as returned by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend user ID.
    pub id: u64,
    /// Login name.
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Phone number.
    #[serde(default)]
    pub cellphone: Option<String>,
    /// Tax identifier (CPF).
    #[serde(default, rename = "taxId")]
    pub tax_id: Option<String>,
    /// Whether the backend considers the user subscribed.
    #[serde(default)]
    pub subscription_active: bool,
}

impl UserProfile {
    /// Returns the name to greet the user with.
    ///
    /// Prefers the first name, falling back to the username.
    pub fn display_name(&self) -> &str {
        if self.first_name.trim().is_empty() {
            &self.username
        } else {
            &self.first_name
        }
    }
}

// ============================================================================
// Login
// ============================================================================

/// Username/password pair sent to the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

impl LoginCredentials {
    /// Creates a new credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Opaque session token.
    pub token: String,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Registration
// ============================================================================

/// Account creation request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
    /// Email address (must be unique).
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Tax identifier (CPF).
    #[serde(rename = "taxId")]
    pub tax_id: String,
    /// Phone number.
    pub cellphone: String,
}

impl Registration {
    /// Returns the login credentials matching this registration.
    pub fn credentials(&self) -> LoginCredentials {
        LoginCredentials::new(&self.username, &self.password)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Account echoed back by the registration endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    /// Login name.
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Tax identifier (CPF).
    #[serde(default, rename = "taxId")]
    pub tax_id: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub cellphone: Option<String>,
}
