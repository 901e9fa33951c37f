// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # gifmint Fetch
//!
//! The request and confirmation layer of gifmint.
//!
//! ## Transport
//!
//! - [`host::http::Gateway`] - Sends every request, attaches the session
//!   credential, and maps every failure to one [`ApiError`] shape
//! - [`credentials::CredentialStore`] - Process-wide session token with a
//!   pluggable [`credentials::TokenSlot`] for persistence
//! - [`context::ClientContext`] - The single object a gateway is built from
//!
//! ## Operations
//!
//! - [`api::GifApi`] - Typed operations over the backend, plus the sign-in,
//!   sign-up, and sign-out flows
//!
//! ## Orchestration
//!
//! - [`profile::ProfileAssembler`] - Concurrent, best-effort profile view
//! - [`poller::ConfirmationPoller`] - Cancellable payment confirmation polling
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gifmint_fetch::{ClientContext, GifApi, ProfileAssembler};
//!
//! let ctx = ClientContext::builder()
//!     .base_url("http://127.0.0.1:8000/api")
//!     .build()?;
//! let api = GifApi::from_context(Arc::new(ctx))?;
//!
//! api.sign_in(&LoginCredentials::new("maria", "s3cret")).await?;
//! let view = ProfileAssembler::new(api.clone()).assemble_profile_view().await?;
//! ```

// Core modules
pub mod api;
pub mod context;
pub mod credentials;
pub mod error;
pub mod host;
pub mod poller;
pub mod profile;

// Re-export key types at crate root

// Errors
pub use error::{
    ApiError, ConfigError, CredentialError, ErrorKind, GENERIC_ERROR_MESSAGE, ProfileError,
    SessionError,
};

// Transport
pub use context::{
    ClientContext, ClientContextBuilder, ClientSettings, DEFAULT_BASE_URL, validate_base_url,
};
pub use credentials::{CredentialStore, MemorySlot, TokenSlot};
pub use host::{Gateway, KeychainSlot, RequestDescriptor};

// Operations & orchestration
pub use api::GifApi;
pub use poller::{
    ConfirmationPoller, PollCallbacks, PollOperation, PollSession, PollState, SubscriptionLookup,
};
pub use profile::{ProfileAssembler, ProfileDataSource};
