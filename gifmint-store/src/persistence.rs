//! File persistence helpers.
//!
//! Settings and the session token are small JSON documents. Both are written
//! atomically and, on Unix, readable by the owner only.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - macOS: `~/Library/Application Support/gifmint`
/// - Linux: `~/.config/gifmint`
/// - Windows: `%APPDATA%\gifmint`
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|c| c.join("gifmint"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default settings file path.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

/// Returns the default session file path.
pub fn default_session_path() -> PathBuf {
    default_config_dir().join("session.json")
}

// ============================================================================
// Owner-only Permissions
// ============================================================================

const FILE_MODE: u32 = 0o600;
const DIR_MODE: u32 = 0o700;

/// Restricts `path` to `mode` on Unix; a no-op elsewhere.
#[cfg(unix)]
async fn restrict(path: &Path, mode: u32) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
    debug!(path = %path.display(), mode = %format!("{mode:o}"), "Restricted permissions");
    Ok(())
}

#[cfg(not(unix))]
#[allow(clippy::unused_async)]
async fn restrict(_path: &Path, _mode: u32) -> Result<(), StoreError> {
    Ok(())
}

/// Creates `path` with owner-only permissions and writes `bytes` to it.
#[cfg(unix)]
async fn write_private(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(FILE_MODE)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(not(unix))]
async fn write_private(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Writes `data` as pretty JSON, atomically and owner-only.
///
/// The document goes to a sibling `.json.tmp` first and is renamed over
/// `path`, so readers never see a half-written file. The staged file is
/// created owner-only; a leftover one from an interrupted write is removed
/// first so it cannot lend its permissions.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }

    let staged = path.with_extension("json.tmp");
    remove_file(&staged).await?;
    write_private(&staged, &serde_json::to_vec_pretty(data)?).await?;
    restrict(&staged, FILE_MODE).await?;
    tokio::fs::rename(&staged, path).await?;

    debug!(path = %path.display(), "Wrote JSON document");
    Ok(())
}

/// Reads and decodes a JSON document.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Loads data from a JSON file, returning the default if missing or invalid.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(e) => {
            if !e.is_not_found() {
                warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            }
            T::default()
        }
    }
}

/// Removes a file. A missing file is not an error.
pub async fn remove_file(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Ensures a directory exists, creating it owner-only if missing.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if path.as_os_str().is_empty() || tokio::fs::try_exists(path).await? {
        return Ok(());
    }

    debug!(path = %path.display(), "Creating directory");
    tokio::fs::create_dir_all(path).await?;
    restrict(path, DIR_MODE).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        assert!(default_settings_path().ends_with("gifmint/settings.json"));
        assert!(default_session_path().ends_with("gifmint/session.json"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("conf").join("secret.json");

        save_json(&file, &serde_json::json!({"token": "x"}))
            .await
            .unwrap();

        let mode = tokio::fs::metadata(&file).await.unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "File should have 0600 permissions");

        let dir_mode = tokio::fs::metadata(file.parent().unwrap())
            .await
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700, "Directory should have 0700 permissions");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_leftover_staged_file_does_not_leak_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("session.json");
        let staged = temp_dir.path().join("session.json.tmp");

        tokio::fs::write(&staged, b"stale").await.unwrap();
        tokio::fs::set_permissions(&staged, std::fs::Permissions::from_mode(0o644))
            .await
            .unwrap();
        tokio::fs::write(&file, b"{}").await.unwrap();
        tokio::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o644))
            .await
            .unwrap();

        save_json(&file, &serde_json::json!({"token": "x"}))
            .await
            .unwrap();

        let mode = tokio::fs::metadata(&file).await.unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(!tokio::fs::try_exists(&staged).await.unwrap());

        let saved: serde_json::Value = load_json(&file).await.unwrap();
        assert_eq!(saved["token"], "x");
    }
}
