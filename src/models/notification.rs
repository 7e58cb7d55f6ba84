//! Notification target: which Telegram chat receives a user's messages

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct NotificationTarget {
    pub id: i32,
    pub user_id: i32,
    pub chat_id: i64,
}
