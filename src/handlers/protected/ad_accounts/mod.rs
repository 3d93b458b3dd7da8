// handlers/protected/ad_accounts/mod.rs - /api/ad-accounts and /api/oauth/connect/:platform

use axum::extract::{Path, State};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{notify, parse_id};
use crate::database::models::{AdAccount, AdAccountPatch, NewAdAccount, Platform, UnknownVariant, User};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, CurrentUser};
use crate::services::plan_limits::{self, LimitedResource};
use crate::services::notifications;
use crate::state::AppState;
use crate::validation::{non_blank, ValidationError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdAccountRequest {
    pub platform: Option<String>,
    pub account_id: Option<String>,
    pub account_name: Option<String>,
    pub is_connected: Option<bool>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
}

impl CreateAdAccountRequest {
    pub fn validate(self, user_id: Uuid) -> Result<NewAdAccount, ValidationError> {
        let mut errors = ValidationError::new();

        let platform = match non_blank(self.platform) {
            Some(p) => errors.parse_enum::<Platform>("platform", &p),
            None => {
                errors.required("platform");
                None
            }
        };
        let account_id = non_blank(self.account_id);
        match account_id.as_deref() {
            Some(v) => errors.name("accountId", v),
            None => errors.required("accountId"),
        }
        let account_name = non_blank(self.account_name);
        match account_name.as_deref() {
            Some(v) => errors.name("accountName", v),
            None => errors.required("accountName"),
        }

        match (platform, account_id, account_name) {
            (Some(platform), Some(account_id), Some(account_name)) if errors.is_empty() => Ok(NewAdAccount {
                user_id,
                platform,
                account_id,
                account_name,
                is_connected: self.is_connected.unwrap_or(true),
                access_token: non_blank(self.access_token),
                refresh_token: non_blank(self.refresh_token),
                token_expires_at: self.token_expires_at,
                last_sync_at: None,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdAccountRequest {
    pub account_name: Option<String>,
    pub is_connected: Option<bool>,
}

impl UpdateAdAccountRequest {
    pub fn validate(self) -> Result<AdAccountPatch, ValidationError> {
        let mut errors = ValidationError::new();
        if let Some(name) = &self.account_name {
            errors.name("accountName", name);
        }
        errors.finish(AdAccountPatch {
            account_name: self.account_name.map(|n| n.trim().to_string()),
            is_connected: self.is_connected,
            last_sync_at: None,
        })
    }
}

async fn load_owned(state: &AppState, user_id: Uuid, raw_id: &str) -> Result<AdAccount, ApiError> {
    let id = parse_id(raw_id, "Ad account")?;
    match state.storage.get_ad_account(id).await? {
        Some(a) if a.user_id == user_id => Ok(a),
        _ => Err(ApiError::not_found("Ad account not found")),
    }
}

async fn ensure_account_capacity(state: &AppState, user: &User) -> Result<(), ApiError> {
    let current = state.storage.list_ad_accounts(user.id).await?.len() as i64;
    plan_limits::ensure_within_limit(user.subscription_plan, LimitedResource::AdAccounts, current)
}

/// GET /api/ad-accounts
pub async fn list(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Vec<AdAccount>> {
    let accounts = state.storage.list_ad_accounts(user.id).await?;
    Ok(ApiResponse::success(accounts))
}

/// POST /api/ad-accounts
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<CreateAdAccountRequest>,
) -> ApiResult<AdAccount> {
    let new = payload.validate(user.id)?;
    ensure_account_capacity(&state, &user).await?;

    let account = state.storage.create_ad_account(new).await?;
    tracing::info!("User {} added {} ad account {}", user.id, account.platform, account.id);
    Ok(ApiResponse::created(account))
}

/// PUT /api/ad-accounts/:id
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateAdAccountRequest>,
) -> ApiResult<AdAccount> {
    let existing = load_owned(&state, user.id, &id).await?;
    let patch = payload.validate()?;
    let account = state.storage.update_ad_account(existing.id, patch).await?;
    Ok(ApiResponse::success(account))
}

/// DELETE /api/ad-accounts/:id - removes the account's campaigns too
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let existing = load_owned(&state, user.id, &id).await?;
    state.storage.delete_ad_account(existing.id).await?;
    tracing::info!("User {} disconnected ad account {}", user.id, existing.id);
    Ok(ApiResponse::success(json!({ "message": "Ad account deleted successfully" })))
}

/// POST /api/ad-accounts/:id/sync - stamps `lastSyncAt`
pub async fn sync(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<AdAccount> {
    let existing = load_owned(&state, user.id, &id).await?;
    if !existing.is_connected {
        return Err(ApiError::conflict("Ad account is disconnected"));
    }
    let patch = AdAccountPatch { last_sync_at: Some(Utc::now()), ..Default::default() };
    let account = state.storage.update_ad_account(existing.id, patch).await?;
    Ok(ApiResponse::success(account))
}

/// POST /api/oauth/connect/:platform - simulated OAuth connection
pub async fn oauth_connect(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(platform): Path<String>,
) -> ApiResult<AdAccount> {
    let platform: Platform = platform.parse().map_err(|e: UnknownVariant| {
        let mut errors = ValidationError::new();
        errors.add("platform", e.to_string());
        errors
    })?;

    ensure_account_capacity(&state, &user).await?;

    let now = Utc::now();
    let new = NewAdAccount {
        user_id: user.id,
        platform,
        account_id: format!("{}_{}", platform, now.timestamp_millis()),
        account_name: format!("{} Account", platform.title()),
        is_connected: true,
        access_token: Some("mock_access_token".to_string()),
        refresh_token: Some("mock_refresh_token".to_string()),
        token_expires_at: Some(now + Duration::hours(1)),
        last_sync_at: Some(now),
    };
    let account = state.storage.create_ad_account(new).await?;
    tracing::info!("User {} connected {} account {}", user.id, platform, account.id);

    notify(&state, notifications::account_connected(user.id, &account)).await;

    Ok(ApiResponse::created(account))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_identity_fields() {
        let err = CreateAdAccountRequest::default().validate(Uuid::new_v4()).unwrap_err();
        assert!(err.get("platform").is_some());
        assert!(err.get("accountId").is_some());
        assert!(err.get("accountName").is_some());
    }

    #[test]
    fn create_defaults_to_connected() {
        let a = CreateAdAccountRequest {
            platform: Some("facebook".into()),
            account_id: Some("act_42".into()),
            account_name: Some("Main".into()),
            ..Default::default()
        }
        .validate(Uuid::new_v4())
        .unwrap();
        assert!(a.is_connected);
        assert_eq!(a.platform, Platform::Facebook);
    }

    #[test]
    fn update_rejects_blank_name() {
        let err = UpdateAdAccountRequest { account_name: Some(" ".into()), is_connected: None }
            .validate()
            .unwrap_err();
        assert!(err.get("accountName").is_some());
    }
}
