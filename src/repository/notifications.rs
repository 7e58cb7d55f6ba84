//! Notification targets (user → Telegram chat id)

use sqlx::{Pool, Postgres};

use super::conflict_on_constraint;
use crate::{
    error::{AppError, AppResult},
    models::notification::NotificationTarget,
};

#[derive(Clone)]
pub struct NotificationsRepository {
    pool: Pool<Postgres>,
}

impl NotificationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Chat id linked to a user, if any
    pub async fn chat_id_for_user(&self, user_id: i32) -> AppResult<Option<i64>> {
        let chat_id = sqlx::query_scalar::<_, i64>(
            "SELECT chat_id FROM notifications WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(chat_id)
    }

    /// Link a user to a chat, replacing a previous link of that user
    pub async fn upsert(&self, user_id: i32, chat_id: i64) -> AppResult<NotificationTarget> {
        sqlx::query_as::<_, NotificationTarget>(
            r#"
            INSERT INTO notifications (user_id, chat_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET chat_id = EXCLUDED.chat_id
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(chat_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_constraint(e, "Chat is already linked to another user"))
    }

    /// Remove the link of a user
    pub async fn delete_by_user(&self, user_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("No Telegram chat linked".to_string()));
        }
        Ok(())
    }
}
