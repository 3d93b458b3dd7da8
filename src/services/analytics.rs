//! Metric derivation and rollups. Pure functions over rows already loaded
//! from storage, so both backends produce identical numbers.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::database::models::{Campaign, CampaignStatus, Platform, PlatformMetrics};

/// Upper bound of the `numeric(5,2)` roas column.
pub const MAX_STORED_ROAS: Decimal = Decimal::from_parts(99999, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedRates {
    pub ctr: Decimal,
    pub cpc: Decimal,
    pub roas: Decimal,
}

/// Zero when the denominator is zero or the quotient does not fit a `Decimal`.
fn ratio(numerator: Decimal, denominator: Decimal, dp: u32) -> Decimal {
    numerator
        .checked_div(denominator)
        .map(|q| q.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or(Decimal::ZERO)
}

/// ctr = clicks / impressions (4 dp), cpc = spend / clicks, roas = revenue / spend
/// (2 dp). A zero denominator yields zero.
pub fn derive_rates(impressions: i64, clicks: i64, spend: Decimal, revenue: Decimal) -> DerivedRates {
    DerivedRates {
        ctr: ratio(Decimal::from(clicks), Decimal::from(impressions), 4),
        cpc: ratio(spend, Decimal::from(clicks), 2),
        roas: ratio(revenue, spend, 2),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTotals {
    pub spend: Decimal,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub revenue: Decimal,
    pub ctr: Decimal,
    pub cpc: Decimal,
    pub roas: Decimal,
}

impl MetricTotals {
    fn add(&mut self, row: &PlatformMetrics) {
        self.spend = self.spend.saturating_add(row.spend);
        self.impressions = self.impressions.saturating_add(i64::from(row.impressions));
        self.clicks = self.clicks.saturating_add(i64::from(row.clicks));
        self.conversions = self.conversions.saturating_add(i64::from(row.conversions));
        self.revenue = self.revenue.saturating_add(row.revenue);
    }

    fn finish(mut self) -> Self {
        let rates = derive_rates(self.impressions, self.clicks, self.spend, self.revenue);
        self.ctr = rates.ctr;
        self.cpc = rates.cpc;
        self.roas = rates.roas;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformShare {
    pub platform: Platform,
    pub spend: Decimal,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    /// Percentage of total spend, 2 dp.
    pub share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub spend: Decimal,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub totals: MetricTotals,
    pub platforms: Vec<PlatformShare>,
    pub daily: Vec<DailyPoint>,
}

pub fn overview(rows: &[PlatformMetrics]) -> AnalyticsOverview {
    let mut totals = MetricTotals::default();
    let mut by_platform: BTreeMap<usize, MetricTotals> = BTreeMap::new();
    let mut by_day: BTreeMap<NaiveDate, MetricTotals> = BTreeMap::new();

    for row in rows {
        totals.add(row);
        let slot = Platform::ALL.iter().position(|p| *p == row.platform).unwrap_or(0);
        by_platform.entry(slot).or_default().add(row);
        by_day.entry(row.date.date_naive()).or_default().add(row);
    }

    let total_spend = totals.spend;
    let platforms = by_platform
        .into_iter()
        .map(|(slot, t)| PlatformShare {
            platform: Platform::ALL[slot],
            spend: t.spend,
            impressions: t.impressions,
            clicks: t.clicks,
            conversions: t.conversions,
            share: ratio(t.spend, total_spend, 4)
                .saturating_mul(Decimal::ONE_HUNDRED)
                .round_dp(2),
        })
        .collect();

    let daily = by_day
        .into_iter()
        .map(|(date, t)| DailyPoint {
            date,
            spend: t.spend,
            impressions: t.impressions,
            clicks: t.clicks,
            conversions: t.conversions,
            revenue: t.revenue,
        })
        .collect();

    AnalyticsOverview { totals: totals.finish(), platforms, daily }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: i64,
    pub draft: i64,
    pub active: i64,
    pub paused: i64,
    pub completed: i64,
}

pub fn status_counts(campaigns: &[Campaign]) -> StatusCounts {
    campaigns.iter().fold(StatusCounts::default(), |mut acc, c| {
        acc.total += 1;
        match c.status {
            CampaignStatus::Draft => acc.draft += 1,
            CampaignStatus::Active => acc.active += 1,
            CampaignStatus::Paused => acc.paused += 1,
            CampaignStatus::Completed => acc.completed += 1,
        }
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(platform: Platform, day: u32, spend: i64, clicks: i32) -> PlatformMetrics {
        PlatformMetrics {
            platform,
            date: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
            impressions: clicks * 10,
            clicks,
            spend: Decimal::new(spend, 0),
            conversions: 1,
            revenue: Decimal::new(spend * 3, 0),
        }
    }

    #[test]
    fn rates_round_and_guard_zero() {
        let r = derive_rates(3, 1, Decimal::new(10, 0), Decimal::new(25, 0));
        assert_eq!(r.ctr, Decimal::new(3333, 4));
        assert_eq!(r.cpc, Decimal::new(1000, 2));
        assert_eq!(r.roas, Decimal::new(250, 2));

        let zero = derive_rates(0, 0, Decimal::ZERO, Decimal::new(5, 0));
        assert_eq!(zero, DerivedRates { ctr: Decimal::ZERO, cpc: Decimal::ZERO, roas: Decimal::ZERO });
    }

    #[test]
    fn overview_rolls_up_platforms_and_days() {
        let rows = vec![
            row(Platform::Google, 1, 30, 10),
            row(Platform::Facebook, 1, 10, 5),
            row(Platform::Google, 2, 60, 15),
        ];
        let o = overview(&rows);

        assert_eq!(o.totals.spend, Decimal::new(100, 0));
        assert_eq!(o.totals.clicks, 30);
        assert_eq!(o.totals.roas, Decimal::new(300, 2));

        assert_eq!(o.platforms.len(), 2);
        assert_eq!(o.platforms[0].platform, Platform::Google);
        assert_eq!(o.platforms[0].share, Decimal::new(9000, 2));
        assert_eq!(o.platforms[1].share, Decimal::new(1000, 2));

        assert_eq!(o.daily.len(), 2);
        assert_eq!(o.daily[0].spend, Decimal::new(40, 0));
        assert!(o.daily[0].date < o.daily[1].date);
    }

    #[test]
    fn extreme_values_do_not_panic() {
        let r = derive_rates(10, 1, Decimal::new(1, 4), Decimal::MAX);
        assert_eq!(r.roas, Decimal::ZERO);

        let mut huge = row(Platform::Google, 1, 0, 1);
        huge.spend = Decimal::MAX;
        let o = overview(&[huge.clone(), huge]);
        assert_eq!(o.totals.spend, Decimal::MAX);
        assert_eq!(o.platforms[0].share, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn empty_overview_is_zeroed() {
        let o = overview(&[]);
        assert_eq!(o.totals, MetricTotals::default());
        assert!(o.platforms.is_empty());
        assert!(o.daily.is_empty());
    }
}
