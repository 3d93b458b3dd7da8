use crate::billing::plan_info;
use crate::database::models::SubscriptionPlan;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitedResource {
    Campaigns,
    AdAccounts,
}

impl LimitedResource {
    fn label(&self) -> &'static str {
        match self {
            LimitedResource::Campaigns => "campaigns",
            LimitedResource::AdAccounts => "ad accounts",
        }
    }
}

pub fn limit_for(plan: SubscriptionPlan, resource: LimitedResource) -> Option<i64> {
    let info = plan_info(plan);
    match resource {
        LimitedResource::Campaigns => info.max_campaigns,
        LimitedResource::AdAccounts => info.max_ad_accounts,
    }
}

/// 403 when creating one more `resource` would exceed the plan.
pub fn ensure_within_limit(
    plan: SubscriptionPlan,
    resource: LimitedResource,
    current: i64,
) -> Result<(), ApiError> {
    match limit_for(plan, resource) {
        Some(max) if current >= max => {
            tracing::info!("Plan limit reached: {} {} on {} plan", current, resource.label(), plan);
            Err(ApiError::forbidden(format!(
                "Your {} plan allows up to {} {}. Upgrade to add more.",
                plan,
                max,
                resource.label()
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_limits() {
        assert!(ensure_within_limit(SubscriptionPlan::Starter, LimitedResource::Campaigns, 9).is_ok());
        let err = ensure_within_limit(SubscriptionPlan::Starter, LimitedResource::Campaigns, 10).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(ensure_within_limit(SubscriptionPlan::Starter, LimitedResource::AdAccounts, 2).is_err());
    }

    #[test]
    fn enterprise_is_unlimited() {
        assert!(ensure_within_limit(SubscriptionPlan::Enterprise, LimitedResource::Campaigns, 10_000).is_ok());
        assert_eq!(limit_for(SubscriptionPlan::Professional, LimitedResource::AdAccounts), Some(10));
    }
}
