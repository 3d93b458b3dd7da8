//! In-process harness: the full router over `MemoryStorage` and a recording
//! payments provider, driven with `tower::ServiceExt::oneshot`.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use crate::app;
use crate::auth::generate_jwt;
use crate::billing::{BillingError, BillingProvider, CreatedSubscription};
use crate::database::models::{Role, UpsertUser, User};
use crate::database::{MemoryStorage, Storage};
use crate::state::AppState;

/// Records every call and answers with predictable ids.
#[derive(Default)]
pub struct FakeBilling {
    calls: Mutex<Vec<String>>,
}

impl FakeBilling {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) -> usize {
        match self.calls.lock() {
            Ok(mut calls) => {
                calls.push(call);
                calls.len()
            }
            Err(_) => 0,
        }
    }
}

#[async_trait]
impl BillingProvider for FakeBilling {
    async fn create_customer(&self, email: &str, name: &str) -> Result<String, BillingError> {
        let n = self.record(format!("customer:{}:{}", email, name));
        Ok(format!("cus_test_{}", n))
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<CreatedSubscription, BillingError> {
        let n = self.record(format!("subscription:{}:{}", customer_id, price_id));
        Ok(CreatedSubscription {
            id: format!("sub_test_{}", n),
            status: "incomplete".to_string(),
            client_secret: format!("pi_test_{}_secret", n),
        })
    }
}

pub struct TestContext {
    pub storage: Arc<MemoryStorage>,
    pub billing: Arc<FakeBilling>,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn code(&self) -> Option<&str> {
        self.body["code"].as_str()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let billing = Arc::new(FakeBilling::default());
        Self::build(Some(billing.clone() as Arc<dyn BillingProvider>), billing, true)
    }

    /// Same router with no payments provider configured.
    pub fn without_billing() -> Self {
        Self::build(None, Arc::new(FakeBilling::default()), true)
    }

    /// Same router with `POST /auth/login` switched off.
    pub fn without_dev_login() -> Self {
        let billing = Arc::new(FakeBilling::default());
        Self::build(Some(billing.clone() as Arc<dyn BillingProvider>), billing, false)
    }

    fn build(provider: Option<Arc<dyn BillingProvider>>, billing: Arc<FakeBilling>, dev_login: bool) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let state = AppState::new(storage.clone() as Arc<dyn Storage>, provider).with_dev_login(dev_login);
        Self { storage, billing, router: app::app(state) }
    }

    /// Creates (or merges) a user and signs a token for it.
    pub async fn login(&self, email: &str) -> anyhow::Result<(User, String)> {
        let user = self
            .storage
            .upsert_user(UpsertUser {
                email: email.to_string(),
                first_name: Some("Test".to_string()),
                last_name: Some("User".to_string()),
                ..Default::default()
            })
            .await?;
        let (token, _) = generate_jwt(&user)?;
        Ok((user, token))
    }

    /// Logs in a user and demotes them to `role`.
    pub async fn login_as(&self, email: &str, role: Role) -> anyhow::Result<(User, String)> {
        let (user, _) = self.login(email).await?;
        let user = self.storage.set_user_role(user.id, role).await?;
        let (token, _) = generate_jwt(&user)?;
        Ok((user, token))
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };

        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, uri: &str, token: &str) -> anyhow::Result<TestResponse> {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> anyhow::Result<TestResponse> {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> anyhow::Result<TestResponse> {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> anyhow::Result<TestResponse> {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Connects a mock account through the OAuth endpoint and returns its id.
    pub async fn connect_account(&self, token: &str, platform: &str) -> anyhow::Result<String> {
        let res = self
            .request(Method::POST, &format!("/api/oauth/connect/{}", platform), Some(token), None)
            .await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "connect failed: {}", res.body);
        res.data()["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("account id missing"))
    }
}
