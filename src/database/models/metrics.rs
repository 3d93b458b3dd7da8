use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Platform;

/// One day of performance numbers for a campaign.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMetrics {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub date: DateTime<Utc>,
    pub impressions: i32,
    pub clicks: i32,
    pub spend: Decimal,
    pub conversions: i32,
    pub revenue: Decimal,
    pub ctr: Decimal,
    pub cpc: Decimal,
    pub roas: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCampaignMetrics {
    pub campaign_id: Uuid,
    pub date: DateTime<Utc>,
    pub impressions: i32,
    pub clicks: i32,
    pub spend: Decimal,
    pub conversions: i32,
    pub revenue: Decimal,
    pub ctr: Decimal,
    pub cpc: Decimal,
    pub roas: Decimal,
}

/// Metric row joined with its campaign's platform, for analytics rollups.
#[derive(Debug, Clone, FromRow)]
pub struct PlatformMetrics {
    #[sqlx(try_from = "String")]
    pub platform: Platform,
    pub date: DateTime<Utc>,
    pub impressions: i32,
    pub clicks: i32,
    pub spend: Decimal,
    pub conversions: i32,
    pub revenue: Decimal,
}

/// Inclusive bounds on `campaign_metrics.date`; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at <= e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn range_bounds_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let range = DateRange { start: Some(start), end: Some(end) };

        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(end + chrono::Duration::seconds(1)));
        assert!(DateRange::default().contains(start));
    }
}
