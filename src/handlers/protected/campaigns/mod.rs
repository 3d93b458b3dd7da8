// handlers/protected/campaigns/mod.rs - /api/campaigns

use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{notify, parse_id};
use crate::database::models::{Campaign, CampaignPatch, CampaignStatus, NewCampaign, Platform};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, CurrentUser};
use crate::services::{notifications, plan_limits};
use crate::state::AppState;
use crate::validation::{non_blank, ValidationError};

pub mod metrics;

pub use metrics::{metrics_get, metrics_post};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub ad_account_id: Option<String>,
    pub external_campaign_id: Option<String>,
    pub name: Option<String>,
    pub platform: Option<String>,
    pub campaign_type: Option<String>,
    pub status: Option<String>,
    pub daily_budget: Option<Decimal>,
    pub total_budget: Option<Decimal>,
    pub target_audience: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl CreateCampaignRequest {
    pub fn validate(self, user_id: Uuid) -> Result<NewCampaign, ValidationError> {
        let mut errors = ValidationError::new();

        let ad_account_id = match non_blank(self.ad_account_id) {
            Some(raw) => errors.uuid("adAccountId", &raw),
            None => {
                errors.required("adAccountId");
                None
            }
        };
        let name = non_blank(self.name);
        match name.as_deref() {
            Some(n) => errors.name("name", n),
            None => errors.required("name"),
        }
        let platform = match non_blank(self.platform) {
            Some(p) => errors.parse_enum::<Platform>("platform", &p),
            None => {
                errors.required("platform");
                None
            }
        };
        let campaign_type = non_blank(self.campaign_type);
        match campaign_type.as_deref() {
            Some(t) => errors.name("campaignType", t),
            None => errors.required("campaignType"),
        }
        let status = match non_blank(self.status) {
            Some(s) => errors.parse_enum::<CampaignStatus>("status", &s),
            None => Some(CampaignStatus::Draft),
        };
        errors.money("dailyBudget", self.daily_budget);
        errors.money("totalBudget", self.total_budget);
        errors.date_order(self.start_date, self.end_date);

        match (ad_account_id, name, platform, campaign_type, status) {
            (Some(ad_account_id), Some(name), Some(platform), Some(campaign_type), Some(status))
                if errors.is_empty() =>
            {
                Ok(NewCampaign {
                    user_id,
                    ad_account_id,
                    external_campaign_id: non_blank(self.external_campaign_id),
                    name,
                    platform,
                    campaign_type,
                    status,
                    daily_budget: self.daily_budget,
                    total_budget: self.total_budget,
                    target_audience: non_blank(self.target_audience),
                    start_date: self.start_date,
                    end_date: self.end_date,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    pub external_campaign_id: Option<String>,
    pub name: Option<String>,
    pub campaign_type: Option<String>,
    pub status: Option<String>,
    pub daily_budget: Option<Decimal>,
    pub total_budget: Option<Decimal>,
    pub target_audience: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl UpdateCampaignRequest {
    /// Checks the patch against the stored row; status and date order are
    /// judged on the merged result.
    pub fn validate(self, existing: &Campaign) -> Result<CampaignPatch, ValidationError> {
        let mut errors = ValidationError::new();

        if let Some(name) = &self.name {
            errors.name("name", name);
        }
        if let Some(t) = &self.campaign_type {
            errors.name("campaignType", t);
        }
        let status = self
            .status
            .as_deref()
            .and_then(|s| errors.parse_enum::<CampaignStatus>("status", s));
        if let Some(next) = status {
            if !existing.status.can_transition_to(next) {
                errors.add("status", format!("A completed campaign cannot be moved to {}", next));
            }
        }
        errors.money("dailyBudget", self.daily_budget);
        errors.money("totalBudget", self.total_budget);
        errors.date_order(
            self.start_date.or(existing.start_date),
            self.end_date.or(existing.end_date),
        );

        errors.finish(CampaignPatch {
            external_campaign_id: non_blank(self.external_campaign_id),
            name: self.name.map(|n| n.trim().to_string()),
            campaign_type: self.campaign_type.map(|t| t.trim().to_string()),
            status,
            daily_budget: self.daily_budget,
            total_budget: self.total_budget,
            target_audience: self.target_audience,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

/// Loads a campaign owned by `user_id`; anything else is 404.
pub(crate) async fn load_owned(state: &AppState, user_id: Uuid, raw_id: &str) -> Result<Campaign, ApiError> {
    let id = parse_id(raw_id, "Campaign")?;
    match state.storage.get_campaign(id).await? {
        Some(c) if c.user_id == user_id => Ok(c),
        _ => Err(ApiError::not_found("Campaign not found")),
    }
}

/// GET /api/campaigns - newest first
pub async fn list(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Vec<Campaign>> {
    let campaigns = state.storage.list_campaigns(user.id).await?;
    Ok(ApiResponse::success(campaigns))
}

/// POST /api/campaigns
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<CreateCampaignRequest>,
) -> ApiResult<Campaign> {
    let new = payload.validate(user.id)?;

    let mut errors = ValidationError::new();
    match state.storage.get_ad_account(new.ad_account_id).await? {
        Some(account) if account.user_id == user.id => {
            if account.platform != new.platform {
                errors.add(
                    "platform",
                    format!("Ad account is connected to {}, not {}", account.platform, new.platform),
                );
            }
        }
        _ => errors.add("adAccountId", "Ad account not found"),
    }
    errors.finish(())?;

    let current = state.storage.count_campaigns(user.id).await?;
    plan_limits::ensure_within_limit(user.subscription_plan, plan_limits::LimitedResource::Campaigns, current)?;

    let campaign = state.storage.create_campaign(new).await?;
    tracing::info!("User {} created campaign {}", user.id, campaign.id);

    notify(&state, notifications::campaign_created(user.id, &campaign)).await;

    Ok(ApiResponse::created(campaign))
}

/// GET /api/campaigns/:id
pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Campaign> {
    let campaign = load_owned(&state, user.id, &id).await?;
    Ok(ApiResponse::success(campaign))
}

/// PUT /api/campaigns/:id - partial update
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateCampaignRequest>,
) -> ApiResult<Campaign> {
    let existing = load_owned(&state, user.id, &id).await?;
    let patch = payload.validate(&existing)?;
    if patch.is_empty() {
        return Ok(ApiResponse::success(existing));
    }

    let campaign = state.storage.update_campaign(existing.id, patch).await?;
    Ok(ApiResponse::success(campaign))
}

/// DELETE /api/campaigns/:id
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let existing = load_owned(&state, user.id, &id).await?;
    state.storage.delete_campaign(existing.id).await?;
    tracing::info!("User {} deleted campaign {}", user.id, existing.id);
    Ok(ApiResponse::success(json!({ "message": "Campaign deleted successfully" })))
}
