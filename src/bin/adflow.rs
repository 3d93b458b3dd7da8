use clap::Parser;
use adflow_api::cli::{report_error, Cli, OutputFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("adflow_api=warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_format = OutputFormat::from_cli(&cli);

    if let Err(e) = adflow_api::cli::run(cli).await {
        report_error(output_format, &e)?;
        std::process::exit(1);
    }

    Ok(())
}
