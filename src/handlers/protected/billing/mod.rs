// handlers/protected/billing/mod.rs - plan catalogue and subscription checkout

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::billing::{BillingError, PlanInfo, PLANS};
use crate::config;
use crate::database::models::SubscriptionPlan;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;
use crate::validation::{non_blank, ValidationError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanListing {
    #[serde(flatten)]
    pub plan: &'static PlanInfo,
    pub price_id: Option<String>,
    pub current: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub price_id: Option<String>,
    pub plan_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCreated {
    pub subscription_id: String,
    pub client_secret: String,
    pub plan: SubscriptionPlan,
}

impl CreateSubscriptionRequest {
    /// Resolves the request to a (plan, price id) pair. `planId` wins when both
    /// are given.
    pub fn resolve(self) -> Result<(SubscriptionPlan, String), ApiError> {
        let billing = &config::config().billing;

        if let Some(plan_id) = non_blank(self.plan_id) {
            let mut errors = ValidationError::new();
            let plan = errors.parse_enum::<SubscriptionPlan>("planId", &plan_id);
            let plan = match errors.finish(plan)? {
                Some(plan) => plan,
                None => return Err(BillingError::UnknownPlan(plan_id).into()),
            };
            let price = billing
                .price_for(plan)
                .ok_or_else(|| BillingError::UnknownPlan(plan_id.clone()))?;
            return Ok((plan, price.to_string()));
        }

        if let Some(price_id) = non_blank(self.price_id) {
            let plan = billing
                .plan_for_price(&price_id)
                .ok_or_else(|| BillingError::UnknownPlan(price_id.clone()))?;
            return Ok((plan, price_id));
        }

        let mut errors = ValidationError::new();
        errors.add("priceId", "priceId or planId is required");
        Err(errors.into())
    }
}

/// GET /api/billing/plans
pub async fn plans(CurrentUser(user): CurrentUser) -> ApiResult<Vec<PlanListing>> {
    let billing = &config::config().billing;
    let listings = PLANS
        .iter()
        .map(|plan| PlanListing {
            plan,
            price_id: billing.price_for(plan.id).map(str::to_string),
            current: plan.id == user.subscription_plan,
        })
        .collect();
    Ok(ApiResponse::success(listings))
}

/// POST /api/create-subscription
///
/// Creates the payments customer on first use, then an incomplete
/// subscription whose first invoice the client confirms with `clientSecret`.
pub async fn create_subscription(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<CreateSubscriptionRequest>,
) -> ApiResult<SubscriptionCreated> {
    let provider = state.billing.clone().ok_or(BillingError::NotConfigured)?;
    let (plan, price_id) = payload.resolve()?;

    let email = user
        .email
        .clone()
        .ok_or_else(|| ApiError::bad_request("User email not found"))?;

    let customer_id = match user.stripe_customer_id.clone() {
        Some(id) => id,
        None => {
            let name = match user.display_name() {
                n if n.is_empty() => email.clone(),
                n => n,
            };
            let id = provider.create_customer(&email, &name).await?;
            state
                .storage
                .update_user_stripe_info(user.id, &id, user.stripe_subscription_id.as_deref())
                .await?;
            id
        }
    };

    let subscription = provider.create_subscription(&customer_id, &price_id).await?;
    state
        .storage
        .update_user_stripe_info(user.id, &customer_id, Some(&subscription.id))
        .await?;
    state.storage.update_user_plan(user.id, plan).await?;

    tracing::info!("User {} subscribed to {} ({})", user.id, plan, subscription.id);

    Ok(ApiResponse::created(SubscriptionCreated {
        subscription_id: subscription.id,
        client_secret: subscription.client_secret,
        plan,
    }))
}
