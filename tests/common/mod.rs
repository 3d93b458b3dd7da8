use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Memory backend and no payments key so the run needs no external services
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_adflow-api"));
        cmd.env("ADFLOW_API_PORT", port.to_string())
            .env("ADFLOW_STORAGE", "memory")
            .env("APP_ENV", "development")
            .env("SECURITY_ALLOW_DEV_LOGIN", "true")
            .env_remove("STRIPE_SECRET_KEY")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// Logs in through the development endpoint and returns the bearer token.
#[allow(dead_code)]
pub async fn login(server: &TestServer, email: &str) -> Result<String> {
    let res = reqwest::Client::new()
        .post(server.url("/auth/login"))
        .json(&json!({ "email": email, "firstName": "Integration", "lastName": "Test" }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

    let body: Value = res.json().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("token missing from login response")
}

/// Unique address per test so parallel tests never share a user.
#[allow(dead_code)]
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, uuid::Uuid::new_v4().simple())
}
