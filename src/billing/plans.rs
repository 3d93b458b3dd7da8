use rust_decimal::Decimal;
use serde::Serialize;

use crate::database::models::SubscriptionPlan;

/// Catalogue entry. `None` limits mean unlimited.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInfo {
    pub id: SubscriptionPlan,
    pub name: &'static str,
    pub monthly_price: Decimal,
    pub max_campaigns: Option<i64>,
    pub max_ad_accounts: Option<i64>,
    pub features: &'static [&'static str],
}

pub static PLANS: [PlanInfo; 3] = [
    PlanInfo {
        id: SubscriptionPlan::Starter,
        name: "Starter",
        monthly_price: Decimal::from_parts(29, 0, 0, false, 0),
        max_campaigns: Some(10),
        max_ad_accounts: Some(2),
        features: &["Up to 10 campaigns", "2 connected ad accounts", "Basic analytics", "Email support"],
    },
    PlanInfo {
        id: SubscriptionPlan::Professional,
        name: "Professional",
        monthly_price: Decimal::from_parts(79, 0, 0, false, 0),
        max_campaigns: Some(50),
        max_ad_accounts: Some(10),
        features: &[
            "Up to 50 campaigns",
            "10 connected ad accounts",
            "Advanced analytics",
            "Team collaboration",
            "Priority support",
        ],
    },
    PlanInfo {
        id: SubscriptionPlan::Enterprise,
        name: "Enterprise",
        monthly_price: Decimal::from_parts(199, 0, 0, false, 0),
        max_campaigns: None,
        max_ad_accounts: None,
        features: &[
            "Unlimited campaigns",
            "Unlimited ad accounts",
            "Custom reporting",
            "Dedicated account manager",
        ],
    },
];

pub fn plan_info(plan: SubscriptionPlan) -> &'static PlanInfo {
    match plan {
        SubscriptionPlan::Starter => &PLANS[0],
        SubscriptionPlan::Professional => &PLANS[1],
        SubscriptionPlan::Enterprise => &PLANS[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_matches_plans() {
        for plan in SubscriptionPlan::ALL {
            assert_eq!(plan_info(*plan).id, *plan);
        }
        assert_eq!(plan_info(SubscriptionPlan::Starter).monthly_price, Decimal::new(29, 0));
        assert_eq!(plan_info(SubscriptionPlan::Enterprise).max_campaigns, None);
    }

    #[test]
    fn prices_serialize_as_strings() {
        let v = serde_json::to_value(plan_info(SubscriptionPlan::Professional)).unwrap();
        assert_eq!(v["monthlyPrice"], "79");
        assert_eq!(v["maxAdAccounts"], 10);
        assert_eq!(v["id"], "professional");
    }
}
