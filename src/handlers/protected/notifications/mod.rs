// handlers/protected/notifications/mod.rs - /api/notifications

use axum::extract::{Path, State};
use serde_json::{json, Value};

use super::parse_id;
use crate::config;
use crate::database::models::Notification;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

/// GET /api/notifications - latest first, capped at `notifications.list_limit`
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<Notification>> {
    let limit = config::config().notifications.list_limit;
    let rows = state.storage.list_notifications(user.id, limit).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Value> {
    let count = state.storage.count_unread_notifications(user.id).await?;
    Ok(ApiResponse::success(json!({ "count": count })))
}

/// PUT /api/notifications/:id/read - only the recipient may mark it
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "Notification")?;
    if !state.storage.mark_notification_read(user.id, id).await? {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(ApiResponse::success(json!({ "message": "Notification marked as read" })))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Value> {
    let updated = state.storage.mark_all_notifications_read(user.id).await?;
    Ok(ApiResponse::success(json!({ "updated": updated })))
}
