use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    AdAccount, AdAccountPatch, Campaign, CampaignMetrics, CampaignPatch, DateRange, NewAdAccount,
    NewCampaign, NewCampaignMetrics, NewNotification, NewTeamMember, Notification, PlatformMetrics,
    ProfilePatch, SubscriptionPlan, TeamMember, TeamMemberPatch, UpsertUser, User,
};
use super::storage::Storage;

const USER_COLUMNS: &str = "id, email, first_name, last_name, profile_image_url, company, \
    subscription_plan, stripe_customer_id, stripe_subscription_id, role, created_at, updated_at";

const AD_ACCOUNT_COLUMNS: &str = "id, user_id, platform, account_id, account_name, is_connected, \
    access_token, refresh_token, token_expires_at, last_sync_at, created_at, updated_at";

const CAMPAIGN_COLUMNS: &str = "id, user_id, ad_account_id, external_campaign_id, name, platform, \
    campaign_type, status, daily_budget, total_budget, target_audience, start_date, end_date, \
    created_at, updated_at";

const METRICS_COLUMNS: &str = "id, campaign_id, date, impressions, clicks, spend, conversions, \
    revenue, ctr, cpc, roas, created_at";

const TEAM_COLUMNS: &str = "id, user_id, team_owner_id, email, role, permissions, status, \
    invited_at, joined_at";

const NOTIFICATION_COLUMNS: &str = "id, user_id, title, message, type, is_read, \
    related_entity_type, related_entity_id, created_at";

/// `Storage` over a Postgres pool.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn not_found(what: &str, id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("{} {} not found", what, id))
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(&self.pool).await?)
    }

    async fn upsert_user(&self, user: UpsertUser) -> Result<User, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO users (email, first_name, last_name, profile_image_url, company)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE SET
                first_name = COALESCE(EXCLUDED.first_name, users.first_name),
                last_name = COALESCE(EXCLUDED.last_name, users.last_name),
                profile_image_url = COALESCE(EXCLUDED.profile_image_url, users.profile_image_url),
                company = COALESCE(EXCLUDED.company, users.company),
                updated_at = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.profile_image_url)
            .bind(&user.company)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_user_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<User, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                company = COALESCE($4, company),
                profile_image_url = COALESCE($5, profile_image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&patch.first_name)
            .bind(&patch.last_name)
            .bind(&patch.company)
            .bind(&patch.profile_image_url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("User", id))
    }

    async fn update_user_stripe_info(
        &self,
        id: Uuid,
        stripe_customer_id: &str,
        stripe_subscription_id: Option<&str>,
    ) -> Result<User, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE users SET
                stripe_customer_id = $2,
                stripe_subscription_id = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(stripe_customer_id)
            .bind(stripe_subscription_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("User", id))
    }

    async fn update_user_plan(&self, id: Uuid, plan: SubscriptionPlan) -> Result<User, DatabaseError> {
        let sql = format!(
            "UPDATE users SET subscription_plan = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(plan.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("User", id))
    }

    async fn list_ad_accounts(&self, user_id: Uuid) -> Result<Vec<AdAccount>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM ad_accounts WHERE user_id = $1 ORDER BY created_at DESC",
            AD_ACCOUNT_COLUMNS
        );
        Ok(sqlx::query_as::<_, AdAccount>(&sql).bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn get_ad_account(&self, id: Uuid) -> Result<Option<AdAccount>, DatabaseError> {
        let sql = format!("SELECT {} FROM ad_accounts WHERE id = $1", AD_ACCOUNT_COLUMNS);
        Ok(sqlx::query_as::<_, AdAccount>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn create_ad_account(&self, account: NewAdAccount) -> Result<AdAccount, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO ad_accounts (
                user_id, platform, account_id, account_name, is_connected,
                access_token, refresh_token, token_expires_at, last_sync_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            AD_ACCOUNT_COLUMNS
        );
        Ok(sqlx::query_as::<_, AdAccount>(&sql)
            .bind(account.user_id)
            .bind(account.platform.as_str())
            .bind(&account.account_id)
            .bind(&account.account_name)
            .bind(account.is_connected)
            .bind(&account.access_token)
            .bind(&account.refresh_token)
            .bind(account.token_expires_at)
            .bind(account.last_sync_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_ad_account(&self, id: Uuid, patch: AdAccountPatch) -> Result<AdAccount, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE ad_accounts SET
                account_name = COALESCE($2, account_name),
                is_connected = COALESCE($3, is_connected),
                last_sync_at = COALESCE($4, last_sync_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            AD_ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, AdAccount>(&sql)
            .bind(id)
            .bind(&patch.account_name)
            .bind(patch.is_connected)
            .bind(patch.last_sync_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("Ad account", id))
    }

    async fn delete_ad_account(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM ad_accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("Ad account", id));
        }
        Ok(())
    }

    async fn list_campaigns(&self, user_id: Uuid) -> Result<Vec<Campaign>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM campaigns WHERE user_id = $1 ORDER BY created_at DESC",
            CAMPAIGN_COLUMNS
        );
        Ok(sqlx::query_as::<_, Campaign>(&sql).bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, DatabaseError> {
        let sql = format!("SELECT {} FROM campaigns WHERE id = $1", CAMPAIGN_COLUMNS);
        Ok(sqlx::query_as::<_, Campaign>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn count_campaigns(&self, user_id: Uuid) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM campaigns WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_campaign(&self, campaign: NewCampaign) -> Result<Campaign, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO campaigns (
                user_id, ad_account_id, external_campaign_id, name, platform, campaign_type,
                status, daily_budget, total_budget, target_audience, start_date, end_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            CAMPAIGN_COLUMNS
        );
        Ok(sqlx::query_as::<_, Campaign>(&sql)
            .bind(campaign.user_id)
            .bind(campaign.ad_account_id)
            .bind(&campaign.external_campaign_id)
            .bind(&campaign.name)
            .bind(campaign.platform.as_str())
            .bind(&campaign.campaign_type)
            .bind(campaign.status.as_str())
            .bind(campaign.daily_budget)
            .bind(campaign.total_budget)
            .bind(&campaign.target_audience)
            .bind(campaign.start_date)
            .bind(campaign.end_date)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_campaign(&self, id: Uuid, patch: CampaignPatch) -> Result<Campaign, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE campaigns SET
                external_campaign_id = COALESCE($2, external_campaign_id),
                name = COALESCE($3, name),
                campaign_type = COALESCE($4, campaign_type),
                status = COALESCE($5, status),
                daily_budget = COALESCE($6, daily_budget),
                total_budget = COALESCE($7, total_budget),
                target_audience = COALESCE($8, target_audience),
                start_date = COALESCE($9, start_date),
                end_date = COALESCE($10, end_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CAMPAIGN_COLUMNS
        );
        sqlx::query_as::<_, Campaign>(&sql)
            .bind(id)
            .bind(&patch.external_campaign_id)
            .bind(&patch.name)
            .bind(&patch.campaign_type)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.daily_budget)
            .bind(patch.total_budget)
            .bind(&patch.target_audience)
            .bind(patch.start_date)
            .bind(patch.end_date)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("Campaign", id))
    }

    async fn delete_campaign(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("Campaign", id));
        }
        Ok(())
    }

    async fn list_campaign_metrics(
        &self,
        campaign_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<CampaignMetrics>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {} FROM campaign_metrics
            WHERE campaign_id = $1
              AND ($2::timestamptz IS NULL OR date >= $2)
              AND ($3::timestamptz IS NULL OR date <= $3)
            ORDER BY date DESC
            "#,
            METRICS_COLUMNS
        );
        Ok(sqlx::query_as::<_, CampaignMetrics>(&sql)
            .bind(campaign_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_campaign_metrics(
        &self,
        metrics: NewCampaignMetrics,
    ) -> Result<CampaignMetrics, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO campaign_metrics (
                campaign_id, date, impressions, clicks, spend, conversions, revenue, ctr, cpc, roas
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            METRICS_COLUMNS
        );
        Ok(sqlx::query_as::<_, CampaignMetrics>(&sql)
            .bind(metrics.campaign_id)
            .bind(metrics.date)
            .bind(metrics.impressions)
            .bind(metrics.clicks)
            .bind(metrics.spend)
            .bind(metrics.conversions)
            .bind(metrics.revenue)
            .bind(metrics.ctr)
            .bind(metrics.cpc)
            .bind(metrics.roas)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_user_metrics(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<PlatformMetrics>, DatabaseError> {
        let rows = sqlx::query_as::<_, PlatformMetrics>(
            r#"
            SELECT c.platform, m.date, m.impressions, m.clicks, m.spend, m.conversions, m.revenue
            FROM campaign_metrics m
            JOIN campaigns c ON c.id = m.campaign_id
            WHERE c.user_id = $1
              AND ($2::timestamptz IS NULL OR m.date >= $2)
              AND ($3::timestamptz IS NULL OR m.date <= $3)
            ORDER BY m.date ASC
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_team_members(&self, team_owner_id: Uuid) -> Result<Vec<TeamMember>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM team_members WHERE team_owner_id = $1 ORDER BY invited_at DESC",
            TEAM_COLUMNS
        );
        Ok(sqlx::query_as::<_, TeamMember>(&sql).bind(team_owner_id).fetch_all(&self.pool).await?)
    }

    async fn get_team_member(&self, id: Uuid) -> Result<Option<TeamMember>, DatabaseError> {
        let sql = format!("SELECT {} FROM team_members WHERE id = $1", TEAM_COLUMNS);
        Ok(sqlx::query_as::<_, TeamMember>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_invitations_by_email(&self, email: &str) -> Result<Vec<TeamMember>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM team_members WHERE lower(email) = lower($1) ORDER BY invited_at DESC",
            TEAM_COLUMNS
        );
        Ok(sqlx::query_as::<_, TeamMember>(&sql).bind(email).fetch_all(&self.pool).await?)
    }

    async fn create_team_member(&self, member: NewTeamMember) -> Result<TeamMember, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO team_members (user_id, team_owner_id, email, role, permissions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TEAM_COLUMNS
        );
        Ok(sqlx::query_as::<_, TeamMember>(&sql)
            .bind(member.user_id)
            .bind(member.team_owner_id)
            .bind(&member.email)
            .bind(member.role.as_str())
            .bind(&member.permissions)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_team_member(&self, id: Uuid, patch: TeamMemberPatch) -> Result<TeamMember, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE team_members SET
                user_id = COALESCE($2, user_id),
                role = COALESCE($3, role),
                permissions = COALESCE($4, permissions),
                status = COALESCE($5, status),
                joined_at = COALESCE($6, joined_at)
            WHERE id = $1
            RETURNING {}
            "#,
            TEAM_COLUMNS
        );
        sqlx::query_as::<_, TeamMember>(&sql)
            .bind(id)
            .bind(patch.user_id)
            .bind(patch.role.map(|r| r.as_str()))
            .bind(&patch.permissions)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.joined_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("Team member", id))
    }

    async fn delete_team_member(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM team_members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("Team member", id));
        }
        Ok(())
    }

    async fn list_notifications(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            NOTIFICATION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, DatabaseError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn create_notification(&self, notification: NewNotification) -> Result<Notification, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO notifications (user_id, title, message, type, related_entity_type, related_entity_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Notification>(&sql)
            .bind(notification.user_id)
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.kind.as_str())
            .bind(notification.related_entity_type.map(|t| t.as_str()))
            .bind(notification.related_entity_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
