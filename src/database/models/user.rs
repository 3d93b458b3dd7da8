use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Role, SubscriptionPlan};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub company: Option<String>,
    #[sqlx(try_from = "String")]
    pub subscription_plan: SubscriptionPlan,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// "First Last", skipping whichever half is missing.
    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Identity-provider profile; inserted or merged by email.
#[derive(Debug, Clone, Default)]
pub struct UpsertUser {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub profile_image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: Option<&str>, last: Option<&str>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: Some("ada@example.com".into()),
            first_name: first.map(Into::into),
            last_name: last.map(Into::into),
            profile_image_url: None,
            company: None,
            subscription_plan: SubscriptionPlan::Starter,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn display_name_joins_present_parts() {
        assert_eq!(user(Some("Ada"), Some("Lovelace")).display_name(), "Ada Lovelace");
        assert_eq!(user(Some("Ada"), None).display_name(), "Ada");
        assert_eq!(user(None, None).display_name(), "");
    }

    #[test]
    fn serializes_camel_case() {
        let v = serde_json::to_value(user(Some("Ada"), None)).unwrap();
        assert_eq!(v["firstName"], "Ada");
        assert_eq!(v["subscriptionPlan"], "starter");
        assert!(v.get("first_name").is_none());
    }
}
