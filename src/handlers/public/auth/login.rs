// handlers/public/auth/login.rs - POST /auth/login

use axum::extract::State;
use serde::Deserialize;
use tracing::info;

use super::TokenResponse;
use crate::auth::generate_jwt;
use crate::database::models::UpsertUser;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{non_blank, ValidationError};

/// Identity profile presented by the development identity provider.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub profile_image_url: Option<String>,
}

impl LoginRequest {
    pub fn validate(self) -> Result<UpsertUser, ValidationError> {
        let mut errors = ValidationError::new();

        let email = non_blank(self.email);
        match email.as_deref() {
            Some(e) => errors.email("email", e),
            None => errors.required("email"),
        }

        let first_name = non_blank(self.first_name);
        let last_name = non_blank(self.last_name);
        let company = non_blank(self.company);
        for (field, value) in [("firstName", &first_name), ("lastName", &last_name), ("company", &company)] {
            if let Some(v) = value {
                errors.name(field, v);
            }
        }

        errors.finish(UpsertUser {
            email: email.unwrap_or_default().to_lowercase(),
            first_name,
            last_name,
            profile_image_url: non_blank(self.profile_image_url),
            company,
        })
    }
}

/// POST /auth/login - upsert the user by email and issue a token.
///
/// Only enabled where `security.allow_dev_login` is set; production
/// deployments sit behind an external identity provider.
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    if !state.allow_dev_login {
        return Err(ApiError::forbidden("Development login is disabled"));
    }

    let profile = payload.validate()?;
    let user = state.storage.upsert_user(profile).await?;
    let (token, expires_in) = generate_jwt(&user)?;

    info!("User {} logged in", user.id);
    Ok(ApiResponse::success(TokenResponse { token, expires_in, user }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_required_and_normalized() {
        let err = LoginRequest::default().validate().unwrap_err();
        assert!(err.get("email").is_some());

        let ok = LoginRequest { email: Some(" Ada@Example.com ".into()), ..Default::default() }
            .validate()
            .unwrap();
        assert_eq!(ok.email, "ada@example.com");
        assert!(ok.first_name.is_none());
    }
}
