use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Platform;

/// A connected advertising account. OAuth tokens stay server-side.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub platform: Platform,
    pub account_id: String,
    pub account_name: String,
    pub is_connected: bool,
    #[serde(skip_serializing, default)]
    pub access_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAdAccount {
    pub user_id: Uuid,
    pub platform: Platform,
    pub account_id: String,
    pub account_name: String,
    pub is_connected: bool,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct AdAccountPatch {
    pub account_name: Option<String>,
    pub is_connected: Option<bool>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_not_serialized() {
        let now = Utc::now();
        let account = AdAccount {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            platform: Platform::Google,
            account_id: "google_1".into(),
            account_name: "Google Account".into(),
            is_connected: true,
            access_token: Some("secret".into()),
            refresh_token: Some("secret".into()),
            token_expires_at: None,
            last_sync_at: None,
            created_at: now,
            updated_at: now,
        };
        let v = serde_json::to_value(&account).unwrap();
        assert!(v.get("accessToken").is_none());
        assert!(v.get("refreshToken").is_none());
        assert_eq!(v["accountName"], "Google Account");
    }
}
