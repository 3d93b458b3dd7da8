// handlers/protected/campaigns/metrics.rs - /api/campaigns/:id/metrics

use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::load_owned;
use crate::database::models::{CampaignMetrics, NewCampaignMetrics};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, CurrentUser};
use crate::services::analytics::{derive_rates, MAX_STORED_ROAS};
use crate::handlers::protected::DateRangeQuery;
use crate::state::AppState;
use crate::validation::{parse_date_range, ValidationError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetricsRequest {
    pub date: Option<DateTime<Utc>>,
    pub impressions: Option<i64>,
    pub clicks: Option<i64>,
    pub spend: Option<Decimal>,
    pub conversions: Option<i64>,
    pub revenue: Option<Decimal>,
}

impl RecordMetricsRequest {
    /// Counts default to zero; ctr, cpc and roas are always derived here,
    /// never taken from the client.
    pub fn validate(self, campaign_id: Uuid) -> Result<NewCampaignMetrics, ValidationError> {
        let mut errors = ValidationError::new();

        let impressions = self.impressions.unwrap_or(0);
        let clicks = self.clicks.unwrap_or(0);
        let conversions = self.conversions.unwrap_or(0);
        let spend = self.spend.unwrap_or(Decimal::ZERO);
        let revenue = self.revenue.unwrap_or(Decimal::ZERO);

        errors.non_negative_count("impressions", impressions);
        errors.non_negative_count("clicks", clicks);
        errors.non_negative_count("conversions", conversions);
        errors.money("spend", Some(spend));
        errors.money("revenue", Some(revenue));
        if clicks > impressions {
            errors.add("clicks", "clicks must not exceed impressions");
        }
        if conversions > clicks {
            errors.add("conversions", "conversions must not exceed clicks");
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let rates = derive_rates(impressions, clicks, spend, revenue);
        Ok(NewCampaignMetrics {
            campaign_id,
            date: self.date.unwrap_or_else(Utc::now),
            impressions: impressions as i32,
            clicks: clicks as i32,
            spend,
            conversions: conversions as i32,
            revenue,
            ctr: rates.ctr,
            cpc: rates.cpc,
            roas: rates.roas.min(MAX_STORED_ROAS),
        })
    }
}

/// GET /api/campaigns/:id/metrics?startDate&endDate - newest first
pub async fn metrics_get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<DateRangeQuery>,
) -> ApiResult<Vec<CampaignMetrics>> {
    let campaign = load_owned(&state, user.id, &id).await?;
    let range = parse_date_range(query.start_date.as_deref(), query.end_date.as_deref())?;
    let rows = state.storage.list_campaign_metrics(campaign.id, range).await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/campaigns/:id/metrics - record one day of numbers
pub async fn metrics_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<RecordMetricsRequest>,
) -> ApiResult<CampaignMetrics> {
    let campaign = load_owned(&state, user.id, &id).await?;
    let new = payload.validate(campaign.id)?;
    let row = state.storage.create_campaign_metrics(new).await?;
    Ok(ApiResponse::created(row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_rates_on_write() {
        let m = RecordMetricsRequest {
            impressions: Some(1000),
            clicks: Some(50),
            spend: Some(Decimal::new(2500, 2)),
            conversions: Some(5),
            revenue: Some(Decimal::new(10000, 2)),
            ..Default::default()
        }
        .validate(Uuid::new_v4())
        .unwrap();

        assert_eq!(m.ctr, Decimal::new(500, 4));
        assert_eq!(m.cpc, Decimal::new(50, 2));
        assert_eq!(m.roas, Decimal::new(400, 2));
    }

    #[test]
    fn funnel_must_narrow() {
        let err = RecordMetricsRequest {
            impressions: Some(10),
            clicks: Some(20),
            conversions: Some(30),
            ..Default::default()
        }
        .validate(Uuid::new_v4())
        .unwrap_err();
        assert!(err.get("clicks").is_some());
        assert!(err.get("conversions").is_some());
    }

    #[test]
    fn negative_values_rejected() {
        let err = RecordMetricsRequest {
            impressions: Some(-1),
            spend: Some(Decimal::new(-100, 2)),
            ..Default::default()
        }
        .validate(Uuid::new_v4())
        .unwrap_err();
        assert!(err.get("impressions").is_some());
        assert!(err.get("spend").is_some());
    }
}
