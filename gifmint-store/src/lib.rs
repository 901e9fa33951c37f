// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # gifmint Store
//!
//! Local persistence for gifmint.
//!
//! - **SettingsStore**: User preferences with persistence
//! - **FileTokenSlot**: Session token kept in an owner-only file
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use gifmint_fetch::CredentialStore;
//! use gifmint_store::{FileTokenSlot, SettingsStore};
//!
//! let settings = SettingsStore::load_default().await.get().await;
//! let credentials = CredentialStore::restore(Arc::new(FileTokenSlot::default_location())).await;
//! ```

pub mod error;
pub mod persistence;
pub mod session;
pub mod settings_store;

pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_session_path, default_settings_path, load_json,
    load_json_or_default, save_json,
};
pub use session::FileTokenSlot;
pub use settings_store::{CredentialBackend, LogLevel, Settings, SettingsStore};

#[cfg(test)]
mod persistence_tests;
