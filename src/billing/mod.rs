//! Subscription billing: the plan catalogue and the payments provider seam.

pub mod plans;
pub mod stripe;

use async_trait::async_trait;

pub use plans::{plan_info, PlanInfo, PLANS};
pub use stripe::StripeClient;

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("billing is not configured")]
    NotConfigured,

    #[error("unknown plan or price: {0}")]
    UnknownPlan(String),

    #[error("payments provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("payments provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("payments provider response missing {0}")]
    MissingField(&'static str),
}

/// A subscription created in `default_incomplete` mode; the client confirms
/// the first payment with `client_secret`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSubscription {
    pub id: String,
    pub status: String,
    pub client_secret: String,
}

#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Returns the provider's customer id.
    async fn create_customer(&self, email: &str, name: &str) -> Result<String, BillingError>;

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<CreatedSubscription, BillingError>;
}
