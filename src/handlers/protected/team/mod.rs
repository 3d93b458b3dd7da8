// handlers/protected/team/mod.rs - /api/team
//
// Owners (role admin) invite members by email. An invitation stays pending
// until the invitee, logged in with the same email, accepts it.

use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{notify, parse_id};
use crate::database::models::{
    MemberStatus, NewTeamMember, Role, TeamMember, TeamMemberPatch, User,
};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, CurrentUser};
use crate::services::notifications;
use crate::state::AppState;
use crate::validation::{non_blank, ValidationError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub email: Option<String>,
    pub role: Option<String>,
    pub permissions: Option<Value>,
}

impl InviteRequest {
    pub fn validate(self, team_owner_id: Uuid) -> Result<NewTeamMember, ValidationError> {
        let mut errors = ValidationError::new();

        let email = non_blank(self.email).map(|e| e.to_lowercase());
        match email.as_deref() {
            Some(e) => errors.email("email", e),
            None => errors.required("email"),
        }
        let role = match non_blank(self.role) {
            Some(r) => errors.parse_enum::<Role>("role", &r),
            None => {
                errors.required("role");
                None
            }
        };
        if matches!(&self.permissions, Some(p) if !p.is_object() && !p.is_null()) {
            errors.add("permissions", "permissions must be an object");
        }

        match (email, role) {
            (Some(email), Some(role)) if errors.is_empty() => Ok(NewTeamMember {
                user_id: None,
                team_owner_id,
                email,
                role,
                permissions: self.permissions.filter(|p| !p.is_null()),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    pub role: Option<String>,
    pub permissions: Option<Value>,
    pub status: Option<String>,
}

impl UpdateMemberRequest {
    /// `accepted` is whether the invitee has ever joined; only then may the
    /// owner set the member back to active.
    pub fn validate(self, accepted: bool) -> Result<TeamMemberPatch, ValidationError> {
        let mut errors = ValidationError::new();
        let role = self.role.as_deref().and_then(|r| errors.parse_enum::<Role>("role", r));
        let status = self
            .status
            .as_deref()
            .and_then(|s| errors.parse_enum::<MemberStatus>("status", s));
        if status == Some(MemberStatus::Active) && !accepted {
            errors.add("status", "status becomes active only when the invitee accepts");
        }
        if matches!(&self.permissions, Some(p) if !p.is_object()) {
            errors.add("permissions", "permissions must be an object");
        }
        errors.finish(TeamMemberPatch {
            role,
            permissions: self.permissions,
            status,
            ..Default::default()
        })
    }
}

fn require_admin(user: &User) -> Result<(), ApiError> {
    if user.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("Only admins can manage the team"))
    }
}

fn same_email(a: &str, b: Option<&str>) -> bool {
    b.map_or(false, |b| a.eq_ignore_ascii_case(b))
}

async fn load_owned(state: &AppState, owner_id: Uuid, raw_id: &str) -> Result<TeamMember, ApiError> {
    let id = parse_id(raw_id, "Team member")?;
    match state.storage.get_team_member(id).await? {
        Some(m) if m.team_owner_id == owner_id => Ok(m),
        _ => Err(ApiError::not_found("Team member not found")),
    }
}

/// GET /api/team - newest invitation first
pub async fn list(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Vec<TeamMember>> {
    require_admin(&user)?;
    let members = state.storage.list_team_members(user.id).await?;
    Ok(ApiResponse::success(members))
}

/// POST /api/team - invite by email
pub async fn invite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<InviteRequest>,
) -> ApiResult<TeamMember> {
    require_admin(&user)?;
    let new = payload.validate(user.id)?;

    if same_email(&new.email, user.email.as_deref()) {
        return Err(ApiError::conflict("You cannot invite yourself"));
    }
    let existing = state.storage.find_invitations_by_email(&new.email).await?;
    if existing
        .iter()
        .any(|m| m.team_owner_id == user.id && m.status != MemberStatus::Inactive)
    {
        return Err(ApiError::conflict(format!("{} is already on your team", new.email)));
    }

    let member = state.storage.create_team_member(new).await?;
    tracing::info!("User {} invited {} as {}", user.id, member.email, member.role);

    notify(&state, notifications::invitation_sent(user.id, &member)).await;

    Ok(ApiResponse::created(member))
}

/// PUT /api/team/:id - change role, permissions or status
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateMemberRequest>,
) -> ApiResult<TeamMember> {
    require_admin(&user)?;
    let existing = load_owned(&state, user.id, &id).await?;
    let patch = payload.validate(existing.joined_at.is_some())?;
    let member = state.storage.update_team_member(existing.id, patch).await?;
    Ok(ApiResponse::success(member))
}

/// DELETE /api/team/:id
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    require_admin(&user)?;
    let existing = load_owned(&state, user.id, &id).await?;
    state.storage.delete_team_member(existing.id).await?;
    tracing::info!("User {} removed team member {}", user.id, existing.id);
    Ok(ApiResponse::success(json!({ "message": "Team member removed successfully" })))
}

/// POST /api/team/:id/accept - the invitee joins the owner's team
pub async fn accept(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<TeamMember> {
    let member_id = parse_id(&id, "Invitation")?;
    let invitation = state
        .storage
        .get_team_member(member_id)
        .await?
        .filter(|m| same_email(&m.email, user.email.as_deref()))
        .ok_or_else(|| ApiError::not_found("Invitation not found"))?;

    if invitation.status != MemberStatus::Pending {
        return Err(ApiError::conflict(format!("Invitation is already {}", invitation.status)));
    }

    let patch = TeamMemberPatch {
        user_id: Some(user.id),
        status: Some(MemberStatus::Active),
        joined_at: Some(Utc::now()),
        ..Default::default()
    };
    let member = state.storage.update_team_member(invitation.id, patch).await?;
    tracing::info!("User {} joined team of {}", user.id, member.team_owner_id);

    notify(&state, notifications::invitation_accepted(&member, &user)).await;

    Ok(ApiResponse::success(member))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_validates_email_and_role() {
        let err = InviteRequest {
            email: Some("not-an-email".into()),
            role: Some("owner".into()),
            permissions: None,
        }
        .validate(Uuid::new_v4())
        .unwrap_err();
        assert!(err.get("email").is_some());
        assert_eq!(err.get("role"), Some("invalid role value: 'owner'"));
    }

    #[test]
    fn invite_normalizes_email() {
        let m = InviteRequest {
            email: Some("Grace@Example.com".into()),
            role: Some("manager".into()),
            permissions: Some(json!({ "campaigns": "write" })),
        }
        .validate(Uuid::new_v4())
        .unwrap();
        assert_eq!(m.email, "grace@example.com");
        assert_eq!(m.role, Role::Manager);
        assert!(m.permissions.is_some());
    }

    #[test]
    fn update_rejects_non_object_permissions() {
        let err = UpdateMemberRequest { permissions: Some(json!([1, 2])), ..Default::default() }
            .validate(false)
            .unwrap_err();
        assert!(err.get("permissions").is_some());
    }

    #[test]
    fn active_status_requires_acceptance() {
        let activate = || UpdateMemberRequest { status: Some("active".into()), ..Default::default() };
        let err = activate().validate(false).unwrap_err();
        assert!(err.get("status").is_some());

        let patch = activate().validate(true).unwrap();
        assert_eq!(patch.status, Some(MemberStatus::Active));

        let patch = UpdateMemberRequest { status: Some("inactive".into()), ..Default::default() }
            .validate(false)
            .unwrap();
        assert_eq!(patch.status, Some(MemberStatus::Inactive));
    }
}
