//! File-backed session token slot.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gifmint_fetch::{CredentialError, TokenSlot};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::persistence::{default_session_path, load_json, remove_file, save_json};

#[derive(Serialize, Deserialize)]
struct SessionFile {
    token: String,
}

/// Keeps the session token in an owner-only JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenSlot {
    path: PathBuf,
}

impl FileTokenSlot {
    /// Creates a slot at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a slot at the default session path.
    pub fn default_location() -> Self {
        Self::new(default_session_path())
    }

    /// Returns the session file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenSlot for FileTokenSlot {
    async fn load(&self) -> Result<Option<String>, CredentialError> {
        match load_json::<SessionFile>(&self.path).await {
            Ok(file) if !file.token.is_empty() => Ok(Some(file.token)),
            Ok(_) => Ok(None),
            Err(e) if e.is_not_found() => {
                debug!(path = %self.path.display(), "No session file");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, token: &str) -> Result<(), CredentialError> {
        let file = SessionFile {
            token: token.to_string(),
        };
        save_json(&self.path, &file).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        remove_file(&self.path).await?;
        Ok(())
    }
}
