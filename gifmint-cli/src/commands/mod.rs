//! CLI command implementations.

pub mod account;
pub mod config;
pub mod generate;
pub mod plans;
pub mod profile;
pub mod subscription;

use std::sync::Arc;

use anyhow::Result;
use gifmint_fetch::{ApiError, ClientContext, CredentialStore, GifApi, KeychainSlot, TokenSlot};
use gifmint_store::{CredentialBackend, FileTokenSlot, Settings, SettingsStore};
use tracing::debug;

use crate::output::TextFormatter;
use crate::{Cli, CliFailure, ExitCode};

/// Message shown when the server rejects the stored credential.
const SESSION_EXPIRED: &str = "Your session has expired or is invalid. Run `gifmint login` again.";

/// A connected client plus the settings it was built from.
pub struct Client {
    pub api: GifApi,
    pub settings: Settings,
}

/// Builds a client from the settings file, flags, and the stored session.
pub async fn connect(cli: &Cli, store: &SettingsStore) -> Result<Client> {
    let settings = store.get().await;

    let slot: Arc<dyn TokenSlot> = match settings.credential_backend {
        CredentialBackend::File => Arc::new(FileTokenSlot::default_location()),
        CredentialBackend::Keychain => Arc::new(KeychainSlot::default()),
    };
    let credentials = Arc::new(CredentialStore::restore(slot).await);

    let context = ClientContext::builder()
        .settings(settings.client_settings(cli.api_url.as_deref()))
        .credentials(credentials)
        .build()?;
    debug!(base_url = %context.base_url(), backend = %settings.credential_backend, "Client ready");

    let api = GifApi::from_context(Arc::new(context))?;
    Ok(Client { api, settings })
}

/// Fails early when no session token is held.
pub fn require_session(api: &GifApi) -> Result<()> {
    if api.credentials().is_present() {
        Ok(())
    } else {
        Err(CliFailure::new(
            ExitCode::NotAuthenticated,
            "Not signed in. Run `gifmint login` first.",
        )
        .into())
    }
}

/// Converts an API error into a CLI failure.
///
/// A rejected credential is cleared before reporting.
pub async fn api_failure(api: &GifApi, err: ApiError) -> anyhow::Error {
    if api.invalidate_if_unauthorized(&err).await {
        return CliFailure::new(ExitCode::NotAuthenticated, SESSION_EXPIRED).into();
    }

    if err.is_network() {
        return CliFailure::new(ExitCode::Error, err.user_message()).into();
    }

    let fields = err.field_errors();
    let has_summary = err.payload_str("error").is_some() || err.payload_str("detail").is_some();
    let message = if !has_summary && fields.len() > 1 {
        let formatter = TextFormatter::new(false);
        format!(
            "The request was rejected:\n{}",
            formatter.format_field_errors(&fields)
        )
    } else {
        err.user_message()
    };

    let code = match err.status {
        Some(status) if (400..500).contains(&status) => ExitCode::Rejected,
        _ => ExitCode::Error,
    };
    CliFailure::new(code, message).into()
}

/// Returns the text formatter for this invocation.
pub fn text_formatter(cli: &Cli) -> TextFormatter {
    TextFormatter::new(!cli.no_color)
}

// ============================================================================
// Tests
// ============================================================================
