// handlers/protected/analytics/mod.rs - /api/analytics/overview and /api/dashboard

use axum::extract::{Query, State};
use serde::Serialize;

use crate::database::models::DateRange;
use crate::handlers::protected::DateRangeQuery;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::analytics::{self, AnalyticsOverview, StatusCounts};
use crate::state::AppState;
use crate::validation::parse_date_range;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCounts {
    pub total: i64,
    pub connected: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub campaigns: StatusCounts,
    pub ad_accounts: AccountCounts,
    pub unread_notifications: i64,
    pub overview: AnalyticsOverview,
}

/// GET /api/analytics/overview?startDate&endDate
pub async fn overview(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<DateRangeQuery>,
) -> ApiResult<AnalyticsOverview> {
    let range = parse_date_range(query.start_date.as_deref(), query.end_date.as_deref())?;
    let rows = state.storage.list_user_metrics(user.id, range).await?;
    Ok(ApiResponse::success(analytics::overview(&rows)))
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<DashboardSummary> {
    let campaigns = state.storage.list_campaigns(user.id).await?;
    let accounts = state.storage.list_ad_accounts(user.id).await?;
    let unread = state.storage.count_unread_notifications(user.id).await?;
    let rows = state.storage.list_user_metrics(user.id, DateRange::default()).await?;

    Ok(ApiResponse::success(DashboardSummary {
        campaigns: analytics::status_counts(&campaigns),
        ad_accounts: AccountCounts {
            total: accounts.len() as i64,
            connected: accounts.iter().filter(|a| a.is_connected).count() as i64,
        },
        unread_notifications: unread,
        overview: analytics::overview(&rows),
    }))
}
