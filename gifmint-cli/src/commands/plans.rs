//! Plans command - list the plan catalog.

use anyhow::Result;
use gifmint_core::SubscriptionView;
use gifmint_fetch::GifApi;
use gifmint_store::SettingsStore;
use tracing::debug;

use super::{api_failure, connect, text_formatter};
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Runs the plans command.
pub async fn run(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let client = connect(cli, store).await?;

    let plans = match client.api.list_plans().await {
        Ok(plans) => plans,
        Err(e) => return Err(api_failure(&client.api, e).await),
    };
    let current = current_subscription(&client.api).await;

    match cli.format {
        OutputFormat::Text => {
            println!(
                "{}",
                text_formatter(cli).format_plans(&plans, current.as_ref())
            );
        }
        OutputFormat::Json => {
            println!(
                "{}",
                JsonFormatter::new(cli.pretty).format_plans(&plans, current.as_ref())?
            );
        }
    }

    Ok(())
}

/// Looks up the caller's subscription to mark the current plan.
///
/// Best-effort: anonymous callers and lookup failures just get no marker.
async fn current_subscription(api: &GifApi) -> Option<SubscriptionView> {
    if !api.credentials().is_present() {
        return None;
    }

    match api.subscription_view().await {
        Ok(view) => Some(view),
        Err(e) => {
            api.invalidate_if_unauthorized(&e).await;
            debug!(error = %e, "Could not determine the current plan");
            None
        }
    }
}
