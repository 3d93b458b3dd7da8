use clap::Args;
use serde_json::json;

use crate::auth::generate_jwt;
use crate::cli::{utils, OutputFormat};
use crate::config::{self, StorageBackend};
use crate::database::models::UpsertUser;
use crate::state::open_storage;
use crate::validation::is_valid_email;

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(help = "User email; the user is created on first use")]
    pub email: String,

    #[arg(long, help = "First name stored on the user")]
    pub first_name: Option<String>,

    #[arg(long, help = "Last name stored on the user")]
    pub last_name: Option<String>,
}

pub async fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    if config.database.backend == StorageBackend::Memory {
        anyhow::bail!("token needs a persistent backend; unset ADFLOW_STORAGE=memory");
    }
    let email = args.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        anyhow::bail!("'{}' is not a valid email address", args.email);
    }

    let storage = open_storage(&config.database).await?;
    let existed = storage.get_user_by_email(&email).await?.is_some();
    let user = storage
        .upsert_user(UpsertUser {
            email,
            first_name: args.first_name,
            last_name: args.last_name,
            ..Default::default()
        })
        .await?;
    let (token, expires_in) = generate_jwt(&user)?;

    match output_format {
        OutputFormat::Json => utils::output_success(
            output_format,
            "Token issued",
            Some(json!({
                "token": token,
                "expires_in": expires_in,
                "user_id": user.id,
                "created": !existed,
            })),
        ),
        OutputFormat::Text => {
            // Bare token on stdout so it can be captured by scripts
            println!("{}", token);
            let verb = if existed { "existing" } else { "new" };
            eprintln!("{} user {} - expires in {}s", verb, user.id, expires_in);
            Ok(())
        }
    }
}
