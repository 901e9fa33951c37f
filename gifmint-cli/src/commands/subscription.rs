//! Subscription commands - subscribe, confirm, cancel.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use gifmint_core::{SubscriptionDetail, SubscriptionView};
use gifmint_fetch::{ApiError, ConfirmationPoller, PollCallbacks};
use gifmint_store::SettingsStore;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{Client, api_failure, connect, require_session, text_formatter};
use crate::output::{ConfirmationOutput, JsonFormatter};
use crate::{Cli, CliFailure, ExitCode, OutputFormat};

/// Arguments for the subscribe command.
#[derive(Args)]
pub struct SubscribeArgs {
    /// Plan ID (see `gifmint plans`).
    #[arg(long)]
    pub plan: u64,

    /// Wait for the payment to be confirmed.
    #[arg(long)]
    pub wait: bool,

    /// Give up waiting after this many seconds.
    #[arg(long, requires = "wait")]
    pub timeout: Option<u64>,
}

/// Arguments for the confirm command.
#[derive(Args)]
pub struct ConfirmArgs {
    /// Give up after this many seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Runs the subscribe command.
pub async fn subscribe(args: &SubscribeArgs, cli: &Cli, store: &SettingsStore) -> Result<()> {
    let client = connect(cli, store).await?;
    require_session(&client.api)?;

    match client.api.subscription_view().await {
        Ok(view) if view.is_active() => {
            let plan = view.plan_name.as_deref().unwrap_or("unknown plan");
            return Err(CliFailure::new(
                ExitCode::Rejected,
                format!("You already have an active subscription ({plan})."),
            )
            .into());
        }
        Ok(_) => {}
        Err(e) if e.is_auth_failure() => return Err(api_failure(&client.api, e).await),
        Err(e) => warn!(error = %e, "Could not check the current subscription"),
    }

    let checkout = match client.api.create_subscription(args.plan).await {
        Ok(checkout) => checkout,
        Err(e) => return Err(api_failure(&client.api, e).await),
    };
    info!(plan_id = args.plan, "Checkout started");

    // The payment address is printed before any wait.
    match cli.format {
        OutputFormat::Text => println!("{}", text_formatter(cli).format_checkout(&checkout, args.wait)),
        OutputFormat::Json => {
            println!(
                "{}",
                JsonFormatter::new(cli.pretty).format_checkout(&checkout, args.wait)?
            );
        }
    }

    if args.wait {
        let timeout = args.timeout.map(Duration::from_secs);
        wait_for_confirmation(&client, cli, timeout, Some(&checkout.payment_url)).await?;
    }

    Ok(())
}

/// Runs the confirm command.
pub async fn confirm(args: &ConfirmArgs, cli: &Cli, store: &SettingsStore) -> Result<()> {
    let client = connect(cli, store).await?;
    require_session(&client.api)?;

    wait_for_confirmation(&client, cli, args.timeout.map(Duration::from_secs), None).await
}

/// Runs the cancel command.
pub async fn cancel(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let client = connect(cli, store).await?;
    require_session(&client.api)?;

    let detail = match client.api.cancel_subscription().await {
        Ok(detail) => detail,
        Err(e) => return Err(api_failure(&client.api, e).await),
    };
    let view = SubscriptionView::from(detail);

    match cli.format {
        OutputFormat::Text => {
            println!("Cancellation requested.");
            println!();
            println!("{}", text_formatter(cli).format_subscription(&view));
        }
        OutputFormat::Json => println!("{}", JsonFormatter::new(cli.pretty).format(&view)?),
    }

    Ok(())
}

// ============================================================================
// Confirmation
// ============================================================================

enum Outcome {
    Confirmed(SubscriptionDetail),
    Failed(ApiError),
}

async fn wait_for_confirmation(
    client: &Client,
    cli: &Cli,
    timeout: Option<Duration>,
    payment_url: Option<&str>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let error_tx = tx.clone();
    let callbacks = PollCallbacks::on_confirmed(move |detail| {
        let _ = tx.send(Outcome::Confirmed(detail));
    })
    .on_error(move |err| {
        let _ = error_tx.send(Outcome::Failed(err));
    });

    let poller = ConfirmationPoller::new(client.settings.poll_interval());
    let session = poller.watch_subscription(client.api.clone(), callbacks);

    if cli.format == OutputFormat::Text && !cli.quiet {
        eprintln!("Waiting for the payment to be confirmed (Ctrl+C to stop)...");
    }

    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    let outcome = tokio::select! {
        outcome = rx.recv() => outcome,
        _ = tokio::signal::ctrl_c() => {
            session.cancel();
            return Err(CliFailure::new(
                ExitCode::Interrupted,
                "Stopped waiting. Run `gifmint confirm` to resume.",
            )
            .into());
        }
        () = deadline => {
            session.cancel();
            return Err(CliFailure::new(
                ExitCode::Timeout,
                "The payment was not confirmed in time. Run `gifmint confirm` to keep waiting.",
            )
            .into());
        }
    };

    let ticks = session.ticks();
    match outcome {
        Some(Outcome::Confirmed(detail)) => {
            let view = SubscriptionView::from(detail);
            info!(ticks, status = ?view.status, "Subscription confirmed");

            match cli.format {
                OutputFormat::Text => {
                    println!("Payment confirmed.");
                    println!();
                    println!("{}", text_formatter(cli).format_subscription(&view));
                }
                OutputFormat::Json => {
                    let output = ConfirmationOutput {
                        state: session.state().to_string(),
                        payment_url: payment_url.map(str::to_string),
                        ticks,
                        subscription: Some(view),
                    };
                    println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
                }
            }
            Ok(())
        }
        Some(Outcome::Failed(err)) => Err(api_failure(&client.api, err).await),
        None => Err(anyhow::anyhow!(
            "Confirmation stopped after {ticks} checks without a result"
        )),
    }
}
