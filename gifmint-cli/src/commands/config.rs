//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use gifmint_store::{
    CredentialBackend, SettingsStore, default_config_dir, default_session_path,
};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Set the backend origin.
    SetUrl {
        /// Origin including the API prefix, e.g. `https://gifs.example.com/api`.
        url: String,
    },

    /// Choose where the session token is kept.
    SetBackend {
        /// Backend: file or keychain.
        backend: String,
    },

    /// Set the confirmation poll interval.
    SetInterval {
        /// Interval in milliseconds.
        millis: u64,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, store: &SettingsStore) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli, store).await,
        ConfigAction::Path => show_paths(cli, store),
        ConfigAction::SetUrl { url } => set_url(url, store).await,
        ConfigAction::SetBackend { backend } => set_backend(backend, store).await,
        ConfigAction::SetInterval { millis } => set_interval(*millis, store).await,
        ConfigAction::Reset => reset_config(store).await,
    }
}

async fn show_config(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let settings = store.get().await;
    let effective = settings.client_settings(cli.api_url.as_deref());

    match cli.format {
        OutputFormat::Text => {
            println!("gifmint Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("API URL:            {}", settings.api_url);
            if effective.base_url != settings.api_url {
                println!("  (overridden by):  {}", effective.base_url);
            }
            println!("Auth scheme:        {}", settings.auth_scheme);
            println!("Request timeout:    {}s", settings.request_timeout_secs);
            println!("Poll interval:      {}ms", settings.poll_interval_ms);
            println!("Credential backend: {}", settings.credential_backend);
            println!("Log level:          {}", settings.log_level);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&settings)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let config_dir = default_config_dir();
    let session_path = default_session_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", store.path().display());
            println!("Session file:  {}", session_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": store.path().display().to_string(),
                "session_file": session_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn set_url(url: &str, store: &SettingsStore) -> Result<()> {
    let url = url.trim().trim_end_matches('/').to_string();
    store.update(|s| s.api_url.clone_from(&url)).await?;
    store.save().await?;

    info!(url = %url, "API URL updated");
    println!("API URL set to: {url}");

    Ok(())
}

async fn set_backend(backend: &str, store: &SettingsStore) -> Result<()> {
    let backend: CredentialBackend = backend.parse()?;
    store.update(|s| s.credential_backend = backend).await?;
    store.save().await?;

    info!(backend = %backend, "Credential backend updated");
    println!("Credential backend set to: {backend}");
    println!("Run `gifmint login` to store a session in the new backend.");

    Ok(())
}

async fn set_interval(millis: u64, store: &SettingsStore) -> Result<()> {
    store.update(|s| s.poll_interval_ms = millis).await?;
    store.save().await?;

    info!(millis, "Poll interval updated");
    println!("Poll interval set to: {millis}ms");

    Ok(())
}

async fn reset_config(store: &SettingsStore) -> Result<()> {
    store.reset().await;
    store.save().await?;

    info!(path = %store.path().display(), "Settings reset");
    println!("Configuration reset to defaults");

    Ok(())
}
