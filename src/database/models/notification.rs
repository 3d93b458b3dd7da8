use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use super::{EntityType, NotificationKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub is_read: bool,
    pub related_entity_type: Option<EntityType>,
    pub related_entity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// Hand-written because the nullable enum column cannot go through `try_from`.
impl<'r> FromRow<'r, PgRow> for Notification {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let decode = |column: &str, err: super::UnknownVariant| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(err),
        };

        let kind: String = row.try_get("type")?;
        let related: Option<String> = row.try_get("related_entity_type")?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            message: row.try_get("message")?,
            kind: kind.parse().map_err(|e| decode("type", e))?,
            is_read: row.try_get("is_read")?,
            related_entity_type: related
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| decode("related_entity_type", e))?,
            related_entity_id: row.try_get("related_entity_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub related_entity_type: Option<EntityType>,
    pub related_entity_id: Option<Uuid>,
}
