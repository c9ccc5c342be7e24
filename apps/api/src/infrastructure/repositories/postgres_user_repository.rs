use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::repositories::{StoreError, StoreResult, User, UserRepository};
use crate::domain::team::TeamName;
use crate::domain::user::UserId;

type UserRow = (String, String, Option<String>, bool);

fn user_from_row((user_id, username, team_name, is_active): UserRow) -> StoreResult<User> {
    Ok(User {
        id: UserId::new(user_id)?,
        username,
        team_name: team_name.map(TeamName::new).transpose()?,
        is_active,
    })
}

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new PostgresUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT user_id, username, team_name, is_active
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row).transpose()
    }

    async fn set_is_active(&self, id: &UserId, is_active: bool) -> StoreResult<User> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            UPDATE users
            SET is_active = $1
            WHERE user_id = $2
            RETURNING user_id, username, team_name, is_active
            "#,
        )
        .bind(is_active)
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row)
            .transpose()?
            .ok_or_else(|| StoreError::NotFound(format!("User not found: {}", id)))
    }
}
