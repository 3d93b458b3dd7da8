use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    AdAccount, AdAccountPatch, Campaign, CampaignMetrics, CampaignPatch, DateRange, NewAdAccount,
    NewCampaign, NewCampaignMetrics, NewNotification, NewTeamMember, Notification, PlatformMetrics,
    ProfilePatch, SubscriptionPlan, TeamMember, TeamMemberPatch, UpsertUser, User,
};

/// Persistence operations behind every handler.
///
/// Lookups by id return `Ok(None)` for missing rows; updates and deletes of a
/// missing row return `DatabaseError::NotFound`. Ownership is checked by the
/// caller, not here.
#[async_trait]
pub trait Storage: Send + Sync {
    // Users
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    async fn upsert_user(&self, user: UpsertUser) -> Result<User, DatabaseError>;
    async fn update_user_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<User, DatabaseError>;
    async fn update_user_stripe_info(
        &self,
        id: Uuid,
        stripe_customer_id: &str,
        stripe_subscription_id: Option<&str>,
    ) -> Result<User, DatabaseError>;
    async fn update_user_plan(&self, id: Uuid, plan: SubscriptionPlan) -> Result<User, DatabaseError>;

    // Ad accounts
    async fn list_ad_accounts(&self, user_id: Uuid) -> Result<Vec<AdAccount>, DatabaseError>;
    async fn get_ad_account(&self, id: Uuid) -> Result<Option<AdAccount>, DatabaseError>;
    async fn create_ad_account(&self, account: NewAdAccount) -> Result<AdAccount, DatabaseError>;
    async fn update_ad_account(&self, id: Uuid, patch: AdAccountPatch) -> Result<AdAccount, DatabaseError>;
    async fn delete_ad_account(&self, id: Uuid) -> Result<(), DatabaseError>;

    // Campaigns
    async fn list_campaigns(&self, user_id: Uuid) -> Result<Vec<Campaign>, DatabaseError>;
    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, DatabaseError>;
    async fn count_campaigns(&self, user_id: Uuid) -> Result<i64, DatabaseError>;
    async fn create_campaign(&self, campaign: NewCampaign) -> Result<Campaign, DatabaseError>;
    async fn update_campaign(&self, id: Uuid, patch: CampaignPatch) -> Result<Campaign, DatabaseError>;
    async fn delete_campaign(&self, id: Uuid) -> Result<(), DatabaseError>;

    // Campaign metrics
    async fn list_campaign_metrics(
        &self,
        campaign_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<CampaignMetrics>, DatabaseError>;
    async fn create_campaign_metrics(
        &self,
        metrics: NewCampaignMetrics,
    ) -> Result<CampaignMetrics, DatabaseError>;
    async fn list_user_metrics(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<PlatformMetrics>, DatabaseError>;

    // Team
    async fn list_team_members(&self, team_owner_id: Uuid) -> Result<Vec<TeamMember>, DatabaseError>;
    async fn get_team_member(&self, id: Uuid) -> Result<Option<TeamMember>, DatabaseError>;
    async fn find_invitations_by_email(&self, email: &str) -> Result<Vec<TeamMember>, DatabaseError>;
    async fn create_team_member(&self, member: NewTeamMember) -> Result<TeamMember, DatabaseError>;
    async fn update_team_member(&self, id: Uuid, patch: TeamMemberPatch) -> Result<TeamMember, DatabaseError>;
    async fn delete_team_member(&self, id: Uuid) -> Result<(), DatabaseError>;

    // Notifications
    async fn list_notifications(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, DatabaseError>;
    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, DatabaseError>;
    async fn create_notification(&self, notification: NewNotification) -> Result<Notification, DatabaseError>;
    /// Returns false when no notification with that id belongs to the user.
    async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
