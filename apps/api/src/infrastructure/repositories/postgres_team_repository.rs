use async_trait::async_trait;
use sqlx::PgPool;

use super::is_unique_violation;
use crate::domain::repositories::{StoreError, StoreResult, TeamRepository};
use crate::domain::team::{Team, TeamMember, TeamName};
use crate::domain::user::UserId;

/// PostgreSQL implementation of TeamRepository
///
/// Provides persistence for Team aggregates using runtime-checked SQLx
/// queries against PostgreSQL.
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    /// Creates a new PostgresTeamRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn create(&self, team: &Team) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO teams (team_name) VALUES ($1)
            "#,
        )
        .bind(team.name().as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("Team already exists: {}", team.name()))
            } else {
                StoreError::Database(e)
            }
        })?;

        for member in team.members() {
            sqlx::query(
                r#"
                INSERT INTO users (user_id, username, team_name, is_active)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id) DO UPDATE SET
                    username = EXCLUDED.username,
                    team_name = EXCLUDED.team_name,
                    is_active = EXCLUDED.is_active
                "#,
            )
            .bind(member.user_id.as_str())
            .bind(&member.username)
            .bind(team.name().as_str())
            .bind(member.is_active)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn find_by_name(&self, name: &TeamName) -> StoreResult<Option<Team>> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM teams WHERE team_name = $1)
            "#,
        )
        .bind(name.as_str())
        .fetch_one(&self.pool)
        .await?;

        if !exists {
            return Ok(None);
        }

        let rows: Vec<(String, String, bool)> = sqlx::query_as(
            r#"
            SELECT user_id, username, is_active
            FROM users
            WHERE team_name = $1
            ORDER BY user_id
            "#,
        )
        .bind(name.as_str())
        .fetch_all(&self.pool)
        .await?;

        let members = rows
            .into_iter()
            .map(|(user_id, username, is_active)| {
                Ok(TeamMember::new(UserId::new(user_id)?, username, is_active))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(Some(Team::from_persistence(name.clone(), members)))
    }
}
