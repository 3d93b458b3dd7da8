//! Row types for the dashboard schema and the string-backed enums stored in
//! its `varchar` columns.

pub mod ad_account;
pub mod campaign;
pub mod metrics;
pub mod notification;
pub mod team_member;
pub mod user;

pub use ad_account::{AdAccount, AdAccountPatch, NewAdAccount};
pub use campaign::{Campaign, CampaignPatch, NewCampaign};
pub use metrics::{CampaignMetrics, DateRange, NewCampaignMetrics, PlatformMetrics};
pub use notification::{NewNotification, Notification};
pub use team_member::{NewTeamMember, TeamMember, TeamMemberPatch};
pub use user::{ProfilePatch, UpsertUser, User};

/// Raised when a stored or submitted string is not a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a lowercase wire enum with `as_str`, `FromStr`, `TryFrom<String>`
/// and serde support, so the same spelling is used in JSON and in SQL.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, UnknownVariant> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(UnknownVariant { kind: $kind, value: other.to_string() }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownVariant;

            fn try_from(value: String) -> Result<Self, UnknownVariant> {
                value.parse()
            }
        }
    };
}

wire_enum! {
    /// Advertising platforms an account can be connected to.
    Platform ("platform") {
        Google => "google",
        Facebook => "facebook",
        Instagram => "instagram",
        Youtube => "youtube",
    }
}

wire_enum! {
    CampaignStatus ("status") {
        Draft => "draft",
        Active => "active",
        Paused => "paused",
        Completed => "completed",
    }
}

wire_enum! {
    /// Role of a user within their own workspace or of an invited member.
    Role ("role") {
        Admin => "admin",
        Manager => "manager",
        Analyst => "analyst",
    }
}

wire_enum! {
    MemberStatus ("status") {
        Pending => "pending",
        Active => "active",
        Inactive => "inactive",
    }
}

wire_enum! {
    NotificationKind ("type") {
        Info => "info",
        Success => "success",
        Warning => "warning",
        Error => "error",
    }
}

wire_enum! {
    EntityType ("relatedEntityType") {
        Campaign => "campaign",
        Account => "account",
        Team => "team",
    }
}

wire_enum! {
    SubscriptionPlan ("subscriptionPlan") {
        Starter => "starter",
        Professional => "professional",
        Enterprise => "enterprise",
    }
}

impl Platform {
    /// Display name used for simulated connections, e.g. "Youtube Account".
    pub fn title(&self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl CampaignStatus {
    /// Completed campaigns are terminal.
    pub fn can_transition_to(&self, next: CampaignStatus) -> bool {
        *self != CampaignStatus::Completed || next == CampaignStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_values() {
        assert_eq!("youtube".parse::<Platform>().unwrap(), Platform::Youtube);
        assert_eq!(
            "tiktok".parse::<Platform>().unwrap_err().to_string(),
            "invalid platform value: 'tiktok'"
        );
        assert_eq!(Role::try_from("analyst".to_string()).unwrap(), Role::Analyst);
    }

    #[test]
    fn notification_kind_error_variant_parses() {
        assert_eq!(NotificationKind::try_from("error".to_string()).unwrap(), NotificationKind::Error);
        assert!("fatal".parse::<NotificationKind>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let v = serde_json::to_value(CampaignStatus::Paused).unwrap();
        assert_eq!(v, serde_json::json!("paused"));
        let plan: SubscriptionPlan = serde_json::from_str("\"enterprise\"").unwrap();
        assert_eq!(plan, SubscriptionPlan::Enterprise);
    }

    #[test]
    fn platform_title_capitalizes() {
        assert_eq!(Platform::Google.title(), "Google");
        assert_eq!(Platform::Youtube.title(), "Youtube");
    }

    #[test]
    fn completed_is_terminal() {
        assert!(CampaignStatus::Draft.can_transition_to(CampaignStatus::Active));
        assert!(CampaignStatus::Paused.can_transition_to(CampaignStatus::Completed));
        assert!(!CampaignStatus::Completed.can_transition_to(CampaignStatus::Active));
        assert!(CampaignStatus::Completed.can_transition_to(CampaignStatus::Completed));
    }
}
