//! Account commands - login, register, logout.

use anyhow::{Context, Result};
use clap::Args;
use gifmint_core::{LoginCredentials, Registration};
use gifmint_fetch::{GifApi, SessionError};
use gifmint_store::SettingsStore;
use tracing::info;

use super::{api_failure, connect, text_formatter};
use crate::output::{JsonFormatter, SessionOutput};
use crate::{Cli, OutputFormat};

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Username.
    #[arg(long, short)]
    pub username: String,

    /// Password.
    #[arg(long, short, env = "GIFMINT_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the register command.
#[derive(Args)]
pub struct RegisterArgs {
    /// Username.
    #[arg(long, short)]
    pub username: String,

    /// Password.
    #[arg(long, short, env = "GIFMINT_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Email address.
    #[arg(long, short)]
    pub email: String,

    /// First name.
    #[arg(long)]
    pub first_name: String,

    /// CPF (taxpayer id).
    #[arg(long)]
    pub tax_id: String,

    /// Mobile phone number.
    #[arg(long)]
    pub cellphone: String,
}

/// Runs the login command.
pub async fn login(args: &LoginArgs, cli: &Cli, store: &SettingsStore) -> Result<()> {
    let client = connect(cli, store).await?;
    let credentials = LoginCredentials::new(args.username.trim(), args.password.as_str());

    if let Err(e) = client.api.sign_in(&credentials).await {
        return Err(session_failure(&client.api, e).await);
    }

    print_session(cli, true, Some(&credentials.username))
}

/// Runs the register command.
pub async fn register(args: &RegisterArgs, cli: &Cli, store: &SettingsStore) -> Result<()> {
    let client = connect(cli, store).await?;
    let registration = Registration {
        username: args.username.trim().to_string(),
        password: args.password.clone(),
        email: args.email.trim().to_string(),
        first_name: args.first_name.trim().to_string(),
        tax_id: args.tax_id.trim().to_string(),
        cellphone: args.cellphone.trim().to_string(),
    };

    let user = match client.api.sign_up(&registration).await {
        Ok(user) => user,
        Err(e) => return Err(session_failure(&client.api, e).await),
    };
    info!(username = %user.username, "Registered");

    if cli.format == OutputFormat::Text && !cli.quiet {
        println!("Account created for {}.", user.username);
    }
    print_session(cli, true, Some(&user.username))
}

/// Runs the logout command.
pub async fn logout(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let client = connect(cli, store).await?;
    client
        .api
        .sign_out()
        .await
        .context("Failed to remove the stored session")?;

    print_session(cli, false, None)
}

fn print_session(cli: &Cli, signed_in: bool, username: Option<&str>) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            if cli.quiet {
                return Ok(());
            }
            let formatter = text_formatter(cli);
            match username {
                Some(name) if signed_in => println!("{}", formatter.format_signed_in(name)),
                _ => println!("Signed out."),
            }
        }
        OutputFormat::Json => {
            let output = SessionOutput {
                signed_in,
                username: username.map(str::to_string),
            };
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }
    Ok(())
}

async fn session_failure(api: &GifApi, err: SessionError) -> anyhow::Error {
    match err {
        SessionError::Api(err) => api_failure(api, err).await,
        SessionError::Credential(err) => {
            anyhow::Error::new(err).context("Signed in, but the session could not be saved")
        }
    }
}
