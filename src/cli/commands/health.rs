use clap::Args;
use serde_json::Value;
use std::time::Duration;

use crate::cli::{CliError, OutputFormat};
use crate::config;

#[derive(Debug, Args)]
pub struct HealthArgs {
    #[arg(long, help = "Server base URL (defaults to http://localhost:<configured port>)")]
    pub url: Option<String>,
}

pub async fn handle(args: HealthArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let base = args
        .url
        .unwrap_or_else(|| format!("http://localhost:{}", config::config().api.port));
    let url = format!("{}/health", base.trim_end_matches('/'));

    let client = reqwest::Client::builder().timeout(Duration::from_secs(5)).build()?;
    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => return Err(CliError::new("UNREACHABLE", format!("{} unreachable: {}", url, e)).into()),
    };

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        match output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
            OutputFormat::Text => {
                let data = &body["data"];
                println!("✓ {} is healthy", base);
                println!("database: {}", data["database"].as_str().unwrap_or("unknown"));
                println!("billing:  {}", data["billing"].as_str().unwrap_or("unknown"));
            }
        }
        Ok(())
    } else {
        Err(CliError::new("UNHEALTHY", format!("{} answered {}", url, status)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_server_fails_with_code() {
        let args = HealthArgs { url: Some("http://127.0.0.1:1/".to_string()) };
        let err = handle(args, OutputFormat::Json).await.unwrap_err();
        let cli_err = err.downcast_ref::<CliError>().unwrap();
        assert_eq!(cli_err.code, "UNREACHABLE");
        assert!(cli_err.message.starts_with("http://127.0.0.1:1/health unreachable"));
    }
}
