//! Users repository for database operations

use sqlx::{Pool, Postgres};

use super::conflict_on_constraint;
use crate::{
    error::{AppError, AppResult},
    models::user::{RegisterUser, User, UserShort},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Short representation for nesting in other resources
    pub async fn get_short(&self, id: i32) -> AppResult<UserShort> {
        sqlx::query_as::<_, UserShort>(
            "SELECT id, email, first_name, last_name FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Create a regular (non-staff) user
    pub async fn create(&self, data: &RegisterUser, password_hash: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, is_staff)
            VALUES (LOWER($1), $2, $3, $4, FALSE)
            RETURNING *
            "#,
        )
        .bind(&data.email)
        .bind(password_hash)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_constraint(e, "Email already registered"))
    }
}
