// handlers/protected/auth/mod.rs - current user and logout

use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::{ProfilePatch, User};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser, CurrentUser, IntoApiResponse};
use crate::state::AppState;
use crate::validation::{non_blank, ValidationError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub profile_image_url: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(self) -> Result<ProfilePatch, ValidationError> {
        let mut errors = ValidationError::new();
        let patch = ProfilePatch {
            first_name: non_blank(self.first_name),
            last_name: non_blank(self.last_name),
            company: non_blank(self.company),
            profile_image_url: non_blank(self.profile_image_url),
        };
        for (field, value) in [
            ("firstName", &patch.first_name),
            ("lastName", &patch.last_name),
            ("company", &patch.company),
        ] {
            if let Some(v) = value {
                errors.name(field, v);
            }
        }
        errors.finish(patch)
    }
}

/// GET /api/auth/user
pub async fn user_get(CurrentUser(user): CurrentUser) -> ApiResult<User> {
    Ok(user.into_api_response())
}

/// PATCH /api/auth/user
pub async fn user_patch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> ApiResult<User> {
    let patch = payload.validate()?;
    let updated = state.storage.update_user_profile(user.id, patch).await?;
    Ok(ApiResponse::success(updated))
}

/// POST /api/logout - tokens are stateless; the client discards its copy.
pub async fn logout(auth: AuthUser) -> ApiResult<Value> {
    tracing::info!("User {} logged out", auth.user_id);
    Ok(ApiResponse::success(json!({ "message": "Logged out successfully" })))
}
