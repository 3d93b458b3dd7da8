// handlers/public/auth/mod.rs - token acquisition

pub mod login;
pub mod refresh;

pub use login::login_post;
pub use refresh::refresh_post;

use serde::Serialize;

use crate::database::models::User;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
    pub user: User,
}
