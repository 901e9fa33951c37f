//! Host APIs for gifmint.
//!
//! - [`http`] - The transport gateway
//! - [`keychain`] - Session token storage in the system keychain

pub mod http;
pub mod keychain;

// Re-export key types
pub use http::{Gateway, RequestDescriptor};
pub use keychain::KeychainSlot;
