use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{BillingError, BillingProvider, CreatedSubscription};
use crate::config::BillingConfig;

/// Stripe REST client: form-encoded bodies, bearer secret key, pinned API version.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    api_base: String,
    api_version: String,
}

#[derive(Debug, Deserialize)]
struct CustomerResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionResponse {
    id: String,
    status: String,
    latest_invoice: Option<InvoiceResponse>,
}

#[derive(Debug, Deserialize)]
struct InvoiceResponse {
    payment_intent: Option<PaymentIntentResponse>,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentResponse {
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl StripeClient {
    pub fn new(
        secret_key: impl Into<String>,
        api_base: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Result<Self, BillingError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            secret_key: secret_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
        })
    }

    /// `None` when no secret key is configured.
    pub fn from_config(config: &BillingConfig) -> Result<Option<Self>, BillingError> {
        match config.secret_key.as_deref() {
            Some(key) => Ok(Some(Self::new(key, &config.api_base, &config.api_version)?)),
            None => Ok(None),
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, BillingError> {
        let body = encode_form(params);
        let url = format!("{}{}", self.api_base, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", &self.api_version)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BillingError::Provider {
                status: status.as_u16(),
                message: provider_message(&text),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

fn encode_form(params: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

fn provider_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| "Payments provider request failed".to_string())
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn create_customer(&self, email: &str, name: &str) -> Result<String, BillingError> {
        let customer: CustomerResponse = self
            .post("/v1/customers", &[("email", email), ("name", name)])
            .await?;
        info!("Created payments customer {}", customer.id);
        Ok(customer.id)
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<CreatedSubscription, BillingError> {
        let subscription: SubscriptionResponse = self
            .post(
                "/v1/subscriptions",
                &[
                    ("customer", customer_id),
                    ("items[0][price]", price_id),
                    ("payment_behavior", "default_incomplete"),
                    ("expand[0]", "latest_invoice.payment_intent"),
                ],
            )
            .await?;

        let client_secret = subscription
            .latest_invoice
            .and_then(|invoice| invoice.payment_intent)
            .and_then(|intent| intent.client_secret)
            .ok_or(BillingError::MissingField("latest_invoice.payment_intent.client_secret"))?;

        info!("Created subscription {} ({})", subscription.id, subscription.status);
        Ok(CreatedSubscription {
            id: subscription.id,
            status: subscription.status,
            client_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Form, http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// Minimal stand-in for the two Stripe endpoints, bound to an ephemeral port.
    async fn fake_stripe() -> String {
        async fn customers(headers: HeaderMap, Form(form): Form<HashMap<String, String>>) -> Json<Value> {
            assert_eq!(headers["authorization"], "Bearer sk_test_123");
            assert_eq!(headers["stripe-version"], "2023-10-16");
            assert_eq!(form["email"], "ada@example.com");
            Json(json!({ "id": "cus_123", "object": "customer" }))
        }

        async fn subscriptions(Form(form): Form<HashMap<String, String>>) -> (axum::http::StatusCode, Json<Value>) {
            if form["items[0][price]"] == "price_missing" {
                return (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(json!({ "error": { "message": "No such price: 'price_missing'" } })),
                );
            }
            assert_eq!(form["payment_behavior"], "default_incomplete");
            assert_eq!(form["expand[0]"], "latest_invoice.payment_intent");
            (
                axum::http::StatusCode::OK,
                Json(json!({
                    "id": "sub_123",
                    "status": "incomplete",
                    "latest_invoice": { "payment_intent": { "client_secret": "pi_123_secret_abc" } }
                })),
            )
        }

        let app = Router::new()
            .route("/v1/customers", post(customers))
            .route("/v1/subscriptions", post(subscriptions));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn encodes_bracketed_keys() {
        let body = encode_form(&[("items[0][price]", "price_1"), ("email", "a+b@example.com")]);
        assert_eq!(body, "items%5B0%5D%5Bprice%5D=price_1&email=a%2Bb%40example.com");
    }

    #[test]
    fn provider_message_falls_back() {
        assert_eq!(provider_message(r#"{"error":{"message":"card declined"}}"#), "card declined");
        assert_eq!(provider_message("<html>"), "Payments provider request failed");
    }

    #[test]
    fn from_config_without_key_is_none() {
        let config = crate::config::config().billing.clone();
        let config = BillingConfig { secret_key: None, ..config };
        assert!(StripeClient::from_config(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn creates_customer_and_subscription() {
        let base = fake_stripe().await;
        let client = StripeClient::new("sk_test_123", base, "2023-10-16").unwrap();

        let customer = client.create_customer("ada@example.com", "Ada Lovelace").await.unwrap();
        assert_eq!(customer, "cus_123");

        let sub = client.create_subscription(&customer, "price_starter").await.unwrap();
        assert_eq!(sub.id, "sub_123");
        assert_eq!(sub.status, "incomplete");
        assert_eq!(sub.client_secret, "pi_123_secret_abc");
    }

    #[tokio::test]
    async fn surfaces_provider_errors() {
        let base = fake_stripe().await;
        let client = StripeClient::new("sk_test_123", base, "2023-10-16").unwrap();

        let err = client.create_subscription("cus_123", "price_missing").await.unwrap_err();
        match err {
            BillingError::Provider { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("price_missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
