//! Profile command - identity, subscription, and history in one view.

use anyhow::Result;
use gifmint_fetch::{ProfileAssembler, ProfileError};
use gifmint_store::SettingsStore;
use tracing::warn;

use super::{connect, require_session, text_formatter};
use crate::output::JsonFormatter;
use crate::{Cli, CliFailure, ExitCode, OutputFormat};

/// Runs the profile command.
pub async fn run(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let client = connect(cli, store).await?;
    require_session(&client.api)?;

    let assembler = ProfileAssembler::new(client.api.clone());
    let view = match assembler.assemble_profile_view().await {
        Ok(view) => view,
        Err(ProfileError::Unauthenticated(err)) => {
            // Any identity failure ends the session.
            if let Err(e) = client.api.sign_out().await {
                warn!(error = %e, "Failed to clear the session");
            }
            let reason = if err.is_network() {
                err.user_message()
            } else {
                "the server did not accept the stored session".to_string()
            };
            return Err(CliFailure::new(
                ExitCode::NotAuthenticated,
                format!("Not authenticated ({reason}). Run `gifmint login` again."),
            )
            .into());
        }
    };

    match cli.format {
        OutputFormat::Text => println!("{}", text_formatter(cli).format_profile(&view)),
        OutputFormat::Json => println!("{}", JsonFormatter::new(cli.pretty).format(&view)?),
    }

    Ok(())
}
