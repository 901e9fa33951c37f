//! Session token storage in the system keychain.
//!
//! - macOS: Keychain Services
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KDE Wallet)

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use crate::credentials::TokenSlot;
use crate::error::CredentialError;

/// Default keychain service name.
pub const DEFAULT_SERVICE: &str = "gifmint";

/// Default keychain account for the session token.
pub const DEFAULT_ACCOUNT: &str = "session_token";

/// A [`TokenSlot`] backed by the `keyring` crate.
#[derive(Debug, Clone)]
pub struct KeychainSlot {
    service: String,
    account: String,
}

impl KeychainSlot {
    /// Creates a slot under the default service and account.
    pub fn new() -> Self {
        Self::with_names(DEFAULT_SERVICE, DEFAULT_ACCOUNT)
    }

    /// Creates a slot under a custom service and account.
    pub fn with_names(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry, CredentialError> {
        Entry::new(&self.service, &self.account)
            .map_err(|e| CredentialError::Keychain(e.to_string()))
    }
}

impl Default for KeychainSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenSlot for KeychainSlot {
    async fn load(&self) -> Result<Option<String>, CredentialError> {
        debug!(service = %self.service, account = %self.account, "Reading session token from keychain");

        match self.entry()?.get_password() {
            Ok(token) if !token.is_empty() => Ok(Some(token)),
            Ok(_) | Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, "No session token in keychain");
                Ok(None)
            }
            Err(e) => {
                warn!(service = %self.service, error = %e, "Failed to read session token");
                Err(e.into())
            }
        }
    }

    async fn save(&self, token: &str) -> Result<(), CredentialError> {
        self.entry()?.set_password(token).map_err(|e| {
            warn!(service = %self.service, error = %e, "Failed to store session token");
            CredentialError::from(e)
        })?;

        debug!(service = %self.service, "Session token stored in keychain");
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, "Session token removed from keychain");
                Ok(())
            }
            Err(e) => {
                warn!(service = %self.service, error = %e, "Failed to delete session token");
                Err(e.into())
            }
        }
    }
}
