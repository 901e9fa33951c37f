//! Session credential store.
//!
//! Holds the opaque token issued at login. Reads are synchronous against an
//! in-memory copy so the gateway can snapshot the current value at dispatch
//! time; writes update memory first, then the durable [`TokenSlot`].
//!
//! The credential is never decoded or validated locally. Only the server
//! decides whether it is still good.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::CredentialError;

// ============================================================================
// Token Slot Trait
// ============================================================================

/// Durable storage for the session token.
///
/// Implementations: [`MemorySlot`] (tests, ephemeral sessions),
/// [`crate::host::keychain::KeychainSlot`], and the file-backed slot in the
/// store crate.
#[async_trait]
pub trait TokenSlot: Send + Sync {
    /// Loads the persisted token, if any.
    async fn load(&self) -> Result<Option<String>, CredentialError>;

    /// Persists the token, replacing any previous value.
    async fn save(&self, token: &str) -> Result<(), CredentialError>;

    /// Removes the persisted token. Succeeds if nothing was stored.
    async fn clear(&self) -> Result<(), CredentialError>;
}

/// A slot that keeps the token in process memory only.
#[derive(Debug, Default)]
pub struct MemorySlot {
    value: Mutex<Option<String>>,
}

impl MemorySlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot holding a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(token.into())),
        }
    }

    /// Returns the stored token.
    pub fn stored(&self) -> Option<String> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TokenSlot for MemorySlot {
    async fn load(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.stored())
    }

    async fn save(&self, token: &str) -> Result<(), CredentialError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// ============================================================================
// Credential Store
// ============================================================================

/// The process-wide holder of the session token.
pub struct CredentialStore {
    current: RwLock<Option<String>>,
    slot: Arc<dyn TokenSlot>,
}

impl CredentialStore {
    /// Creates an empty store backed by the given slot.
    pub fn new(slot: Arc<dyn TokenSlot>) -> Self {
        Self {
            current: RwLock::new(None),
            slot,
        }
    }

    /// Creates an empty store that persists nothing beyond the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySlot::new()))
    }

    /// Creates a store seeded from whatever the slot has persisted.
    ///
    /// A slot that fails to load yields an empty store; the user will simply
    /// have to sign in again.
    pub async fn restore(slot: Arc<dyn TokenSlot>) -> Self {
        let token = match slot.load().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to restore session credential");
                None
            }
        };

        debug!(present = token.is_some(), "Restored session credential");
        Self {
            current: RwLock::new(token),
            slot,
        }
    }

    /// Returns a snapshot of the current token.
    pub fn get(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns true if a token is held.
    pub fn is_present(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replaces the token.
    ///
    /// Memory is updated before persisting, so subsequent requests in this
    /// process carry the new token even if persistence fails.
    pub async fn set(&self, token: impl Into<String>) -> Result<(), CredentialError> {
        let token = token.into();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

        self.slot.save(&token).await.map_err(|e| {
            warn!(error = %e, "Failed to persist session credential");
            e
        })?;

        debug!("Session credential stored");
        Ok(())
    }

    /// Removes the token.
    pub async fn clear(&self) -> Result<(), CredentialError> {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;

        self.slot.clear().await.map_err(|e| {
            warn!(error = %e, "Failed to remove persisted session credential");
            e
        })?;

        debug!("Session credential cleared");
        Ok(())
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("present", &self.is_present())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSlot;

    #[async_trait]
    impl TokenSlot for BrokenSlot {
        async fn load(&self) -> Result<Option<String>, CredentialError> {
            Err(CredentialError::Storage("disk on fire".to_string()))
        }

        async fn save(&self, _token: &str) -> Result<(), CredentialError> {
            Err(CredentialError::Storage("read-only".to_string()))
        }

        async fn clear(&self) -> Result<(), CredentialError> {
            Err(CredentialError::Storage("read-only".to_string()))
        }
    }

    #[tokio::test]
    async fn test_set_get_clear() {
        let slot = Arc::new(MemorySlot::new());
        let store = CredentialStore::new(slot.clone());
        assert!(store.get().is_none());

        store.set("abc").await.unwrap();
        assert_eq!(store.get().as_deref(), Some("abc"));
        assert_eq!(slot.stored().as_deref(), Some("abc"));

        store.set("def").await.unwrap();
        assert_eq!(store.get().as_deref(), Some("def"));

        store.clear().await.unwrap();
        assert!(!store.is_present());
        assert!(slot.stored().is_none());
    }

    #[tokio::test]
    async fn test_restore_from_slot() {
        let slot = Arc::new(MemorySlot::with_token("persisted"));
        let store = CredentialStore::restore(slot).await;
        assert_eq!(store.get().as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn test_restore_failure_starts_empty() {
        let store = CredentialStore::restore(Arc::new(BrokenSlot)).await;
        assert!(!store.is_present());
    }

    #[tokio::test]
    async fn test_memory_wins_when_persistence_fails() {
        let store = CredentialStore::new(Arc::new(BrokenSlot));

        assert!(store.set("abc").await.is_err());
        assert_eq!(store.get().as_deref(), Some("abc"));

        assert!(store.clear().await.is_err());
        assert!(store.get().is_none());
    }

    #[test]
    fn test_debug_hides_token() {
        let store = CredentialStore::new(Arc::new(MemorySlot::with_token("secret")));
        assert!(!format!("{store:?}").contains("secret"));
    }
}
