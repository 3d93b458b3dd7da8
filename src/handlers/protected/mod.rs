// handlers/protected/mod.rs - endpoints behind JWT + user validation
//
// Every handler receives `CurrentUser`; rows owned by someone else are
// reported as missing (404) rather than forbidden.

pub mod ad_accounts;
pub mod analytics;
pub mod auth;
pub mod billing;
pub mod campaigns;
pub mod notifications;
pub mod team;

use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::NewNotification;
use crate::error::ApiError;
use crate::state::AppState;

/// `?startDate=&endDate=` on metric and analytics reads.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Path ids that do not parse cannot name an existing row.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", what)))
}

/// Notifications are a side effect; failing to record one does not fail the request.
pub(crate) async fn notify(state: &AppState, notification: NewNotification) {
    let title = notification.title.clone();
    if let Err(e) = state.storage.create_notification(notification).await {
        tracing::warn!("Failed to record notification '{}': {}", title, e);
    }
}
