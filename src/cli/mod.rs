pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "adflow")]
#[command(about = "AdFlow admin CLI - migrations, tokens, plans and health checks")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply database migrations to DATABASE_URL")]
    Migrate,

    #[command(about = "Issue a bearer token for a user, creating the user if needed")]
    Token(commands::token::TokenArgs),

    #[command(about = "Show the subscription plan catalogue and configured price ids")]
    Plans,

    #[command(about = "Check a running server's /health endpoint")]
    Health(commands::health::HealthArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Failure with a machine-readable code, reported once by the binary.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CliError {
    pub code: &'static str,
    pub message: String,
}

impl CliError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// Prints a failed command's error in the requested format.
pub fn report_error(output_format: OutputFormat, err: &anyhow::Error) -> anyhow::Result<()> {
    let code = err.downcast_ref::<CliError>().map(|e| e.code);
    let verbose = matches!(std::env::var("CLI_VERBOSE").as_deref(), Ok("true") | Ok("1"));
    let message = if verbose { format!("{err:?}") } else { err.to_string() };
    utils::output_error(output_format, &message, code)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Token(args) => commands::token::handle(args, output_format).await,
        Commands::Plans => commands::plans::handle(output_format),
        Commands::Health(args) => commands::health::handle(args, output_format).await,
    }
}
