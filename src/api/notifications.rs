//! Notifications service

use serde::Deserialize;
use serde_json::Value;

use super::{id_string, required_id, ApiClient};
use crate::error::{Result, TaskflowError};
use crate::model::Notification;
use crate::timestamp::RawTimestamp;

#[derive(Deserialize)]
struct NotificationListDto {
    #[serde(default)]
    nots: Option<Vec<NotificationDto>>,
}

#[derive(Deserialize)]
struct NotificationDto {
    #[serde(default, alias = "notId", alias = "not_id")]
    id: Option<Value>,
    #[serde(default, alias = "createdAt")]
    created_at: Option<RawTimestamp>,
    #[serde(default, alias = "userId")]
    user_id: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl NotificationDto {
    fn decode(self, endpoint: &str) -> Result<Notification> {
        Ok(Notification {
            id: required_id(endpoint, "notification id", self.id.as_ref())?,
            created_at: self
                .created_at
                .ok_or_else(|| TaskflowError::decode(endpoint, "missing createdAt"))?
                .decode()?,
            user_id: self.user_id.as_ref().and_then(id_string).unwrap_or_default(),
            message: self.message.unwrap_or_default(),
            read: self.status.as_deref() != Some("unread"),
        })
    }
}

impl ApiClient {
    /// Newest first. `recipient` is a username, a user id or a project id.
    pub async fn list_notifications(&self, recipient: &str) -> Result<Vec<Notification>> {
        const ENDPOINT: &str = "/notifications/{userId}";
        let dto: NotificationListDto = self.get(ENDPOINT, &["notifications", recipient]).await?;
        let mut items = dto
            .nots
            .unwrap_or_default()
            .into_iter()
            .map(|n| n.decode(ENDPOINT))
            .collect::<Result<Vec<_>>>()?;
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }
}
