use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    AdAccount, AdAccountPatch, Campaign, CampaignMetrics, CampaignPatch, DateRange, MemberStatus,
    NewAdAccount, NewCampaign, NewCampaignMetrics, NewNotification, NewTeamMember, Notification,
    PlatformMetrics, ProfilePatch, Role, SubscriptionPlan, TeamMember, TeamMemberPatch, UpsertUser,
    User,
};
use super::storage::Storage;

/// Rows kept in insertion order; "newest first" listings iterate in reverse.
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    ad_accounts: Vec<AdAccount>,
    campaigns: Vec<Campaign>,
    metrics: Vec<CampaignMetrics>,
    team_members: Vec<TeamMember>,
    notifications: Vec<Notification>,
}

impl Tables {
    fn user_mut(&mut self, id: Uuid) -> Result<&mut User, DatabaseError> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))
    }

    fn require_user(&self, id: Uuid) -> Result<(), DatabaseError> {
        if self.users.iter().any(|u| u.id == id) {
            Ok(())
        } else {
            Err(DatabaseError::NotFound(format!("User {} not found", id)))
        }
    }

    /// Mirrors the `ON DELETE CASCADE` chain from campaigns down to metrics.
    fn drop_campaigns(&mut self, mut keep: impl FnMut(&Campaign) -> bool) {
        let mut removed = Vec::new();
        self.campaigns.retain(|c| {
            let k = keep(c);
            if !k {
                removed.push(c.id);
            }
            k
        });
        self.metrics.retain(|m| !removed.contains(&m.campaign_id));
    }
}

/// In-process `Storage` used by tests and `ADFLOW_STORAGE=memory`.
/// Enforces the same uniqueness and reference rules as the SQL schema.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roles have no API surface; tests set them directly.
    #[cfg(test)]
    pub async fn set_user_role(&self, id: Uuid, role: Role) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(id)?;
        user.role = role;
        Ok(user.clone())
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.as_deref().map_or(false, |e| same_email(e, email)))
            .cloned())
    }

    async fn upsert_user(&self, user: UpsertUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        if let Some(existing) = tables
            .users
            .iter_mut()
            .find(|u| u.email.as_deref().map_or(false, |e| same_email(e, &user.email)))
        {
            if user.first_name.is_some() {
                existing.first_name = user.first_name;
            }
            if user.last_name.is_some() {
                existing.last_name = user.last_name;
            }
            if user.profile_image_url.is_some() {
                existing.profile_image_url = user.profile_image_url;
            }
            if user.company.is_some() {
                existing.company = user.company;
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let row = User {
            id: Uuid::new_v4(),
            email: Some(user.email),
            first_name: user.first_name,
            last_name: user.last_name,
            profile_image_url: user.profile_image_url,
            company: user.company,
            subscription_plan: SubscriptionPlan::Starter,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(row.clone());
        Ok(row)
    }

    async fn update_user_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(id)?;
        if patch.first_name.is_some() {
            user.first_name = patch.first_name;
        }
        if patch.last_name.is_some() {
            user.last_name = patch.last_name;
        }
        if patch.company.is_some() {
            user.company = patch.company;
        }
        if patch.profile_image_url.is_some() {
            user.profile_image_url = patch.profile_image_url;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_user_stripe_info(
        &self,
        id: Uuid,
        stripe_customer_id: &str,
        stripe_subscription_id: Option<&str>,
    ) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(id)?;
        user.stripe_customer_id = Some(stripe_customer_id.to_string());
        user.stripe_subscription_id = stripe_subscription_id.map(str::to_string);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_user_plan(&self, id: Uuid, plan: SubscriptionPlan) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(id)?;
        user.subscription_plan = plan;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list_ad_accounts(&self, user_id: Uuid) -> Result<Vec<AdAccount>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .ad_accounts
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_ad_account(&self, id: Uuid) -> Result<Option<AdAccount>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.ad_accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn create_ad_account(&self, account: NewAdAccount) -> Result<AdAccount, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_user(account.user_id)?;

        let now = Utc::now();
        let row = AdAccount {
            id: Uuid::new_v4(),
            user_id: account.user_id,
            platform: account.platform,
            account_id: account.account_id,
            account_name: account.account_name,
            is_connected: account.is_connected,
            access_token: account.access_token,
            refresh_token: account.refresh_token,
            token_expires_at: account.token_expires_at,
            last_sync_at: account.last_sync_at,
            created_at: now,
            updated_at: now,
        };
        tables.ad_accounts.push(row.clone());
        Ok(row)
    }

    async fn update_ad_account(&self, id: Uuid, patch: AdAccountPatch) -> Result<AdAccount, DatabaseError> {
        let mut tables = self.tables.write().await;
        let account = tables
            .ad_accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Ad account {} not found", id)))?;

        if let Some(v) = patch.account_name {
            account.account_name = v;
        }
        if let Some(v) = patch.is_connected {
            account.is_connected = v;
        }
        if let Some(v) = patch.last_sync_at {
            account.last_sync_at = Some(v);
        }
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    async fn delete_ad_account(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.ad_accounts.len();
        tables.ad_accounts.retain(|a| a.id != id);
        if tables.ad_accounts.len() == before {
            return Err(DatabaseError::NotFound(format!("Ad account {} not found", id)));
        }
        tables.drop_campaigns(|c| c.ad_account_id != id);
        Ok(())
    }

    async fn list_campaigns(&self, user_id: Uuid) -> Result<Vec<Campaign>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .campaigns
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.campaigns.iter().find(|c| c.id == id).cloned())
    }

    async fn count_campaigns(&self, user_id: Uuid) -> Result<i64, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.campaigns.iter().filter(|c| c.user_id == user_id).count() as i64)
    }

    async fn create_campaign(&self, campaign: NewCampaign) -> Result<Campaign, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_user(campaign.user_id)?;
        if !tables.ad_accounts.iter().any(|a| a.id == campaign.ad_account_id) {
            return Err(DatabaseError::NotFound(format!(
                "Ad account {} not found",
                campaign.ad_account_id
            )));
        }

        let now = Utc::now();
        let row = Campaign {
            id: Uuid::new_v4(),
            user_id: campaign.user_id,
            ad_account_id: campaign.ad_account_id,
            external_campaign_id: campaign.external_campaign_id,
            name: campaign.name,
            platform: campaign.platform,
            campaign_type: campaign.campaign_type,
            status: campaign.status,
            daily_budget: campaign.daily_budget,
            total_budget: campaign.total_budget,
            target_audience: campaign.target_audience,
            start_date: campaign.start_date,
            end_date: campaign.end_date,
            created_at: now,
            updated_at: now,
        };
        tables.campaigns.push(row.clone());
        Ok(row)
    }

    async fn update_campaign(&self, id: Uuid, patch: CampaignPatch) -> Result<Campaign, DatabaseError> {
        let mut tables = self.tables.write().await;
        let campaign = tables
            .campaigns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Campaign {} not found", id)))?;
        patch.apply(campaign);
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn delete_campaign(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.campaigns.iter().any(|c| c.id == id) {
            return Err(DatabaseError::NotFound(format!("Campaign {} not found", id)));
        }
        tables.drop_campaigns(|c| c.id != id);
        Ok(())
    }

    async fn list_campaign_metrics(
        &self,
        campaign_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<CampaignMetrics>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<CampaignMetrics> = tables
            .metrics
            .iter()
            .filter(|m| m.campaign_id == campaign_id && range.contains(m.date))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn create_campaign_metrics(
        &self,
        metrics: NewCampaignMetrics,
    ) -> Result<CampaignMetrics, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.campaigns.iter().any(|c| c.id == metrics.campaign_id) {
            return Err(DatabaseError::NotFound(format!(
                "Campaign {} not found",
                metrics.campaign_id
            )));
        }

        let row = CampaignMetrics {
            id: Uuid::new_v4(),
            campaign_id: metrics.campaign_id,
            date: metrics.date,
            impressions: metrics.impressions,
            clicks: metrics.clicks,
            spend: metrics.spend,
            conversions: metrics.conversions,
            revenue: metrics.revenue,
            ctr: metrics.ctr,
            cpc: metrics.cpc,
            roas: metrics.roas,
            created_at: Utc::now(),
        };
        tables.metrics.push(row.clone());
        Ok(row)
    }

    async fn list_user_metrics(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<PlatformMetrics>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<PlatformMetrics> = tables
            .metrics
            .iter()
            .filter(|m| range.contains(m.date))
            .filter_map(|m| {
                tables
                    .campaigns
                    .iter()
                    .find(|c| c.id == m.campaign_id && c.user_id == user_id)
                    .map(|c| PlatformMetrics {
                        platform: c.platform,
                        date: m.date,
                        impressions: m.impressions,
                        clicks: m.clicks,
                        spend: m.spend,
                        conversions: m.conversions,
                        revenue: m.revenue,
                    })
            })
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(rows)
    }

    async fn list_team_members(&self, team_owner_id: Uuid) -> Result<Vec<TeamMember>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .team_members
            .iter()
            .rev()
            .filter(|m| m.team_owner_id == team_owner_id)
            .cloned()
            .collect())
    }

    async fn get_team_member(&self, id: Uuid) -> Result<Option<TeamMember>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.team_members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_invitations_by_email(&self, email: &str) -> Result<Vec<TeamMember>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .team_members
            .iter()
            .rev()
            .filter(|m| same_email(&m.email, email))
            .cloned()
            .collect())
    }

    async fn create_team_member(&self, member: NewTeamMember) -> Result<TeamMember, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_user(member.team_owner_id)?;
        if let Some(user_id) = member.user_id {
            tables.require_user(user_id)?;
        }

        let row = TeamMember {
            id: Uuid::new_v4(),
            user_id: member.user_id,
            team_owner_id: member.team_owner_id,
            email: member.email,
            role: member.role,
            permissions: member.permissions,
            status: MemberStatus::Pending,
            invited_at: Utc::now(),
            joined_at: None,
        };
        tables.team_members.push(row.clone());
        Ok(row)
    }

    async fn update_team_member(&self, id: Uuid, patch: TeamMemberPatch) -> Result<TeamMember, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(user_id) = patch.user_id {
            tables.require_user(user_id)?;
        }
        let member = tables
            .team_members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Team member {} not found", id)))?;
        patch.apply(member);
        Ok(member.clone())
    }

    async fn delete_team_member(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.team_members.len();
        tables.team_members.retain(|m| m.id != id);
        if tables.team_members.len() == before {
            return Err(DatabaseError::NotFound(format!("Team member {} not found", id)));
        }
        Ok(())
    }

    async fn list_notifications(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn create_notification(&self, notification: NewNotification) -> Result<Notification, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_user(notification.user_id)?;

        let row = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            title: notification.title,
            message: notification.message,
            kind: notification.kind,
            is_read: false,
            related_entity_type: notification.related_entity_type,
            related_entity_id: notification.related_entity_id,
            created_at: Utc::now(),
        };
        tables.notifications.push(row.clone());
        Ok(row)
    }

    async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        match tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.write().await;
        let mut updated = 0;
        for n in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CampaignStatus, NotificationKind, Platform};
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    async fn seed_user(storage: &MemoryStorage, email: &str) -> User {
        storage
            .upsert_user(UpsertUser { email: email.to_string(), ..Default::default() })
            .await
            .unwrap()
    }

    async fn seed_account(storage: &MemoryStorage, user_id: Uuid) -> AdAccount {
        storage
            .create_ad_account(NewAdAccount {
                user_id,
                platform: Platform::Google,
                account_id: "google_1".into(),
                account_name: "Google Account".into(),
                is_connected: true,
                access_token: None,
                refresh_token: None,
                token_expires_at: None,
                last_sync_at: None,
            })
            .await
            .unwrap()
    }

    fn new_campaign(user_id: Uuid, ad_account_id: Uuid, name: &str) -> NewCampaign {
        NewCampaign {
            user_id,
            ad_account_id,
            external_campaign_id: None,
            name: name.to_string(),
            platform: Platform::Google,
            campaign_type: "search".into(),
            status: CampaignStatus::Draft,
            daily_budget: Some(Decimal::new(5000, 2)),
            total_budget: None,
            target_audience: None,
            start_date: None,
            end_date: None,
        }
    }

    #[tokio::test]
    async fn upsert_merges_by_email() {
        let storage = MemoryStorage::new();
        let first = storage
            .upsert_user(UpsertUser {
                email: "ada@example.com".into(),
                first_name: Some("Ada".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let second = storage
            .upsert_user(UpsertUser {
                email: "ADA@example.com".into(),
                last_name: Some("Lovelace".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let found = storage.get_user_by_email("Ada@Example.COM").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(second.display_name(), "Ada Lovelace");
        assert_eq!(second.subscription_plan, SubscriptionPlan::Starter);
        assert_eq!(second.role, Role::Admin);
    }

    #[tokio::test]
    async fn campaigns_list_newest_first_and_cascade() {
        let storage = MemoryStorage::new();
        let user = seed_user(&storage, "a@example.com").await;
        let account = seed_account(&storage, user.id).await;

        let older = storage.create_campaign(new_campaign(user.id, account.id, "older")).await.unwrap();
        let newer = storage.create_campaign(new_campaign(user.id, account.id, "newer")).await.unwrap();

        let listed = storage.list_campaigns(user.id).await.unwrap();
        assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![newer.id, older.id]);
        assert_eq!(storage.count_campaigns(user.id).await.unwrap(), 2);

        storage.delete_ad_account(account.id).await.unwrap();
        assert_eq!(storage.count_campaigns(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn campaign_requires_existing_account() {
        let storage = MemoryStorage::new();
        let user = seed_user(&storage, "a@example.com").await;
        let err = storage
            .create_campaign(new_campaign(user.id, Uuid::new_v4(), "orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn metrics_filter_by_range() {
        let storage = MemoryStorage::new();
        let user = seed_user(&storage, "a@example.com").await;
        let account = seed_account(&storage, user.id).await;
        let campaign = storage.create_campaign(new_campaign(user.id, account.id, "c")).await.unwrap();

        let day = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        for offset in 0..3 {
            storage
                .create_campaign_metrics(NewCampaignMetrics {
                    campaign_id: campaign.id,
                    date: day + Duration::days(offset),
                    impressions: 100,
                    clicks: 10,
                    spend: Decimal::new(1000, 2),
                    conversions: 1,
                    revenue: Decimal::new(3000, 2),
                    ctr: Decimal::new(1000, 4),
                    cpc: Decimal::new(100, 2),
                    roas: Decimal::new(300, 2),
                })
                .await
                .unwrap();
        }

        let range = DateRange { start: Some(day + Duration::days(1)), end: None };
        let rows = storage.list_campaign_metrics(campaign.id, range).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].date > rows[1].date);

        let platform_rows = storage.list_user_metrics(user.id, DateRange::default()).await.unwrap();
        assert_eq!(platform_rows.len(), 3);
        assert!(platform_rows[0].date < platform_rows[2].date);
    }

    #[tokio::test]
    async fn notifications_are_scoped_to_owner() {
        let storage = MemoryStorage::new();
        let alice = seed_user(&storage, "alice@example.com").await;
        let bob = seed_user(&storage, "bob@example.com").await;

        let n = storage
            .create_notification(NewNotification {
                user_id: alice.id,
                title: "Hello".into(),
                message: "World".into(),
                kind: NotificationKind::Info,
                related_entity_type: None,
                related_entity_id: None,
            })
            .await
            .unwrap();

        assert!(!storage.mark_notification_read(bob.id, n.id).await.unwrap());
        assert_eq!(storage.count_unread_notifications(alice.id).await.unwrap(), 1);
        assert!(storage.mark_notification_read(alice.id, n.id).await.unwrap());
        assert_eq!(storage.count_unread_notifications(alice.id).await.unwrap(), 0);
        assert_eq!(storage.mark_all_notifications_read(alice.id).await.unwrap(), 0);
    }
}
