// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! gifmint CLI - subscriptions and GIF generation from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Sign in
//! gifmint login --username maria --password 's3cret!'
//!
//! # Profile, subscription and history
//! gifmint profile
//!
//! # Subscribe and wait for the payment to be confirmed
//! gifmint subscribe --plan 2 --wait --timeout 600
//!
//! # Generate a GIF
//! gifmint generate --prompt "gato astronauta" --text "Bom dia!"
//!
//! # JSON output against another backend
//! gifmint --api-url https://gifs.example.com/api --format json plans
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use gifmint_store::{LogLevel, SettingsStore};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{account, config, generate, plans, profile, subscription};

// ============================================================================
// CLI Definition
// ============================================================================

/// gifmint CLI - subscriptions and GIF generation.
#[derive(Parser)]
#[command(name = "gifmint")]
#[command(about = "Subscription and GIF generation client")]
#[command(long_about = r#"
gifmint talks to the GIF generation backend: sign in, pick a plan, pay for
it, and generate animated GIFs from a prompt.

Examples:
  gifmint login -u maria -p secret   # Sign in
  gifmint plans                      # List plans
  gifmint subscribe --plan 1 --wait  # Subscribe and wait for payment
  gifmint generate --prompt "gato"   # Generate a GIF
  gifmint --format json profile      # JSON output
"#)]
#[command(version)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Backend origin (overrides the settings file).
    #[arg(long, env = "GIFMINT_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Sign in.
    Login(account::LoginArgs),

    /// Create an account and sign in.
    Register(account::RegisterArgs),

    /// Sign out and forget the session.
    Logout,

    /// Show profile, subscription, and recent GIFs.
    #[command(visible_alias = "me")]
    Profile,

    /// List subscription plans.
    #[command(visible_alias = "p")]
    Plans,

    /// Start a subscription checkout.
    Subscribe(subscription::SubscribeArgs),

    /// Wait for a pending payment to be confirmed.
    Confirm(subscription::ConfirmArgs),

    /// Request cancellation of the current subscription.
    Cancel,

    /// Generate a GIF.
    #[command(visible_alias = "g")]
    Generate(generate::GenerateArgs),

    /// List generated GIFs.
    #[command(visible_alias = "h")]
    History,

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    #[allow(dead_code)]
    Success = 0,
    /// General error (network, unexpected response).
    Error = 1,
    /// No valid session.
    NotAuthenticated = 2,
    /// The backend refused the request (validation, quota, plan rules).
    Rejected = 3,
    /// Gave up waiting.
    Timeout = 4,
    /// Interrupted by Ctrl+C.
    Interrupted = 130,
}

/// An error that ends the process with a specific exit code.
#[derive(Debug)]
pub struct CliFailure {
    /// Exit code.
    pub code: ExitCode,
    /// Message for stderr.
    pub message: String,
}

impl CliFailure {
    /// Creates a failure.
    pub fn new(code: ExitCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CliFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliFailure {}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: LogLevel) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("gifmint=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("gifmint={level}")))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = SettingsStore::load_default().await;
    setup_logging(cli.verbose, cli.quiet, store.get().await.log_level);

    let result = match &cli.command {
        Commands::Login(args) => account::login(args, &cli, &store).await,
        Commands::Register(args) => account::register(args, &cli, &store).await,
        Commands::Logout => account::logout(&cli, &store).await,
        Commands::Profile => profile::run(&cli, &store).await,
        Commands::Plans => plans::run(&cli, &store).await,
        Commands::Subscribe(args) => subscription::subscribe(args, &cli, &store).await,
        Commands::Confirm(args) => subscription::confirm(args, &cli, &store).await,
        Commands::Cancel => subscription::cancel(&cli, &store).await,
        Commands::Generate(args) => generate::generate(args, &cli, &store).await,
        Commands::History => generate::history(&cli, &store).await,
        Commands::Config(args) => config::run(args, &cli, &store).await,
    };

    if let Err(e) = result {
        let code = e
            .downcast_ref::<CliFailure>()
            .map_or(ExitCode::Error, |failure| failure.code);
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(code as i32);
    }

    Ok(())
}
