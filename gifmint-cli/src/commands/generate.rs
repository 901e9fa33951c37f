//! Generation commands - generate a GIF, list history.

use anyhow::{Result, bail};
use clap::Args;
use gifmint_core::GenerateRequest;
use gifmint_store::SettingsStore;
use tracing::info;

use super::{api_failure, connect, require_session, text_formatter};
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the generate command.
#[derive(Args)]
pub struct GenerateArgs {
    /// What the GIF should show.
    #[arg(long, short)]
    pub prompt: String,

    /// Text overlaid on the GIF.
    #[arg(long, short, default_value = "")]
    pub text: String,
}

/// Runs the generate command.
pub async fn generate(args: &GenerateArgs, cli: &Cli, store: &SettingsStore) -> Result<()> {
    let prompt = args.prompt.trim();
    if prompt.is_empty() {
        bail!("The prompt must not be empty");
    }

    let client = connect(cli, store).await?;
    require_session(&client.api)?;

    let request = GenerateRequest::new(prompt).with_text(args.text.trim());
    let gif = match client.api.generate_gif(&request).await {
        Ok(gif) => gif,
        Err(e) => return Err(api_failure(&client.api, e).await),
    };
    info!(url = %gif.gif_url, "GIF generated");

    match cli.format {
        OutputFormat::Text => println!("{}", text_formatter(cli).format_generated(&gif)),
        OutputFormat::Json => println!("{}", JsonFormatter::new(cli.pretty).format(&gif)?),
    }

    Ok(())
}

/// Runs the history command.
pub async fn history(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let client = connect(cli, store).await?;
    require_session(&client.api)?;

    let records = match client.api.fetch_history().await {
        Ok(records) => records,
        Err(e) => return Err(api_failure(&client.api, e).await),
    };

    match cli.format {
        OutputFormat::Text => println!("{}", text_formatter(cli).format_history(&records)),
        OutputFormat::Json => println!("{}", JsonFormatter::new(cli.pretty).format(&records)?),
    }

    Ok(())
}
