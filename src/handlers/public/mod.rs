// handlers/public/mod.rs - endpoints reachable without a token

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub mod auth;

/// GET / - service information
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "AdFlow API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Marketing dashboard backend: ad accounts, campaigns, analytics, teams and billing",
            "endpoints": {
                "health": "/health (public)",
                "auth": "/auth/login, /auth/refresh (public - token acquisition)",
                "user": "/api/auth/user, /api/logout (protected)",
                "campaigns": "/api/campaigns[/:id[/metrics]] (protected)",
                "ad_accounts": "/api/ad-accounts[/:id[/sync]], /api/oauth/connect/:platform (protected)",
                "team": "/api/team[/:id[/accept]] (protected, admin)",
                "notifications": "/api/notifications[/:id/read|/read-all|/unread-count] (protected)",
                "billing": "/api/billing/plans, /api/create-subscription (protected)",
                "analytics": "/api/analytics/overview, /api/dashboard (protected)",
            }
        }
    }))
}

/// GET /health - storage ping; 503 when the backend is unreachable
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    if let Err(e) = state.storage.health_check().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Database unavailable"));
    }

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok",
        "billing": if state.billing.is_some() { "configured" } else { "disabled" },
    })))
}
