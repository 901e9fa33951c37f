//! Persistence tests for settings and the session file.

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use gifmint_fetch::{CredentialStore, TokenSlot};

use crate::persistence::{ensure_dir, load_json, load_json_or_default, save_json};
use crate::session::FileTokenSlot;
use crate::settings_store::{CredentialBackend, LogLevel, Settings, SettingsStore};

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("a").join("b").join("test.json");

    save_json(&nested, &serde_json::json!({"key": "value"}))
        .await
        .unwrap();

    assert!(nested.exists());
    assert!(!nested.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let result: Result<Settings, _> =
        load_json(&PathBuf::from("/nonexistent/path/settings.json")).await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_load_corrupted_file_falls_back_to_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    tokio::fs::write(&path, "{ this is not json").await.unwrap();

    let settings: Settings = load_json_or_default(&path).await;
    assert_eq!(settings, Settings::default());
}

#[tokio::test]
async fn test_ensure_dir_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("config");

    ensure_dir(&dir).await.unwrap();
    ensure_dir(&dir).await.unwrap();
    assert!(dir.is_dir());
}

// ============================================================================
// Settings Store Tests
// ============================================================================

#[tokio::test]
async fn test_settings_store_save_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");

    let store = SettingsStore::load(path.clone()).await;
    assert_eq!(store.get().await, Settings::default());

    store
        .update(|s| {
            s.api_url = "https://gifs.example.com/api".to_string();
            s.credential_backend = CredentialBackend::Keychain;
            s.log_level = LogLevel::Debug;
        })
        .await
        .unwrap();
    store.save().await.unwrap();

    let reloaded = SettingsStore::load(path).await.get().await;
    assert_eq!(reloaded.api_url, "https://gifs.example.com/api");
    assert_eq!(reloaded.credential_backend, CredentialBackend::Keychain);
    assert_eq!(reloaded.log_level, LogLevel::Debug);
}

#[tokio::test]
async fn test_settings_store_corrupted_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    tokio::fs::write(&path, "[]").await.unwrap();

    let store = SettingsStore::load(path).await;
    assert_eq!(store.get().await, Settings::default());
}

// ============================================================================
// Session File Tests
// ============================================================================

#[tokio::test]
async fn test_file_slot_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let slot = FileTokenSlot::new(temp_dir.path().join("session.json"));

    assert_eq!(slot.load().await.unwrap(), None);

    slot.save("abc123").await.unwrap();
    assert_eq!(slot.load().await.unwrap().as_deref(), Some("abc123"));

    slot.clear().await.unwrap();
    assert_eq!(slot.load().await.unwrap(), None);
    assert!(!slot.path().exists());

    // Clearing twice is fine
    slot.clear().await.unwrap();
}

#[tokio::test]
async fn test_file_slot_corrupted_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");
    tokio::fs::write(&path, "garbage").await.unwrap();

    let slot = FileTokenSlot::new(path);
    assert!(slot.load().await.is_err());
}

#[tokio::test]
async fn test_credential_store_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");

    let first = CredentialStore::restore(Arc::new(FileTokenSlot::new(path.clone()))).await;
    assert!(!first.is_present());
    first.set("persisted-token").await.unwrap();

    let second = CredentialStore::restore(Arc::new(FileTokenSlot::new(path.clone()))).await;
    assert_eq!(second.get().as_deref(), Some("persisted-token"));

    second.clear().await.unwrap();
    let third = CredentialStore::restore(Arc::new(FileTokenSlot::new(path))).await;
    assert!(!third.is_present());
}
