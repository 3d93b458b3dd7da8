use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{CampaignStatus, Platform};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ad_account_id: Uuid,
    pub external_campaign_id: Option<String>,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub platform: Platform,
    pub campaign_type: String,
    #[sqlx(try_from = "String")]
    pub status: CampaignStatus,
    pub daily_budget: Option<Decimal>,
    pub total_budget: Option<Decimal>,
    pub target_audience: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub user_id: Uuid,
    pub ad_account_id: Uuid,
    pub external_campaign_id: Option<String>,
    pub name: String,
    pub platform: Platform,
    pub campaign_type: String,
    pub status: CampaignStatus,
    pub daily_budget: Option<Decimal>,
    pub total_budget: Option<Decimal>,
    pub target_audience: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct CampaignPatch {
    pub external_campaign_id: Option<String>,
    pub name: Option<String>,
    pub campaign_type: Option<String>,
    pub status: Option<CampaignStatus>,
    pub daily_budget: Option<Decimal>,
    pub total_budget: Option<Decimal>,
    pub target_audience: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl CampaignPatch {
    pub fn is_empty(&self) -> bool {
        self.external_campaign_id.is_none()
            && self.name.is_none()
            && self.campaign_type.is_none()
            && self.status.is_none()
            && self.daily_budget.is_none()
            && self.total_budget.is_none()
            && self.target_audience.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    /// Applies the patch to an in-memory row, as the SQL `COALESCE` update does.
    pub fn apply(self, campaign: &mut Campaign) {
        if let Some(v) = self.external_campaign_id {
            campaign.external_campaign_id = Some(v);
        }
        if let Some(v) = self.name {
            campaign.name = v;
        }
        if let Some(v) = self.campaign_type {
            campaign.campaign_type = v;
        }
        if let Some(v) = self.status {
            campaign.status = v;
        }
        if let Some(v) = self.daily_budget {
            campaign.daily_budget = Some(v);
        }
        if let Some(v) = self.total_budget {
            campaign.total_budget = Some(v);
        }
        if let Some(v) = self.target_audience {
            campaign.target_audience = Some(v);
        }
        if let Some(v) = self.start_date {
            campaign.start_date = Some(v);
        }
        if let Some(v) = self.end_date {
            campaign.end_date = Some(v);
        }
    }
}
