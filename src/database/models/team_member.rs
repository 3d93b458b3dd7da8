use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::{MemberStatus, Role};

/// An invitation into a team owner's workspace. `user_id` is filled in when
/// the invitee accepts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub team_owner_id: Uuid,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub permissions: Option<Value>,
    #[sqlx(try_from = "String")]
    pub status: MemberStatus,
    pub invited_at: DateTime<Utc>,
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTeamMember {
    pub user_id: Option<Uuid>,
    pub team_owner_id: Uuid,
    pub email: String,
    pub role: Role,
    pub permissions: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct TeamMemberPatch {
    pub user_id: Option<Uuid>,
    pub role: Option<Role>,
    pub permissions: Option<Value>,
    pub status: Option<MemberStatus>,
    pub joined_at: Option<DateTime<Utc>>,
}

impl TeamMemberPatch {
    pub fn apply(self, member: &mut TeamMember) {
        if let Some(v) = self.user_id {
            member.user_id = Some(v);
        }
        if let Some(v) = self.role {
            member.role = v;
        }
        if let Some(v) = self.permissions {
            member.permissions = Some(v);
        }
        if let Some(v) = self.status {
            member.status = v;
        }
        if let Some(v) = self.joined_at {
            member.joined_at = Some(v);
        }
    }
}
