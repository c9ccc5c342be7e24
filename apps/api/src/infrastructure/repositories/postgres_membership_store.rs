use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::domain::errors::DomainError;
use crate::domain::pull_request::{PrStatus, PullRequest, PullRequestId};
use crate::domain::repositories::{MembershipStore, PrSnapshot, StoreError, StoreResult, StoreTx};
use crate::domain::team::TeamName;
use crate::domain::user::UserId;

use super::is_unique_violation;
use super::postgres_pull_request_repository::load_pull_request;

fn to_strings<'a>(ids: impl IntoIterator<Item = &'a UserId>) -> Vec<String> {
    ids.into_iter().map(|id| id.as_str().to_owned()).collect()
}

fn to_user_ids(rows: Vec<String>) -> StoreResult<Vec<UserId>> {
    Ok(rows
        .into_iter()
        .map(UserId::new)
        .collect::<Result<Vec<_>, _>>()?)
}

/// PostgreSQL implementation of the transactional membership store
///
/// Each unit of work is a database transaction. Row locks follow one order
/// across all units: user rows first, then pull request rows by id.
pub struct PostgresMembershipStore {
    pool: PgPool,
}

impl PostgresMembershipStore {
    /// Creates a new PostgresMembershipStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PostgresMembershipStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTx { tx: Some(tx) }))
    }
}

/// Open database transaction; rolled back on drop unless committed
pub struct PgStoreTx {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgStoreTx {
    fn conn(&mut self) -> StoreResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or(StoreError::TransactionFinished)
    }
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn user_team(&mut self, user_id: &UserId) -> StoreResult<Option<TeamName>> {
        let team: Option<Option<String>> = sqlx::query_scalar(
            r#"
            SELECT team_name FROM users WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(self.conn()?)
        .await?;

        Ok(team.flatten().map(TeamName::new).transpose()?)
    }

    async fn user_exists(&mut self, user_id: &UserId) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)
            "#,
        )
        .bind(user_id.as_str())
        .fetch_one(self.conn()?)
        .await?;

        Ok(exists)
    }

    async fn active_members(&mut self, team: &TeamName) -> StoreResult<Vec<UserId>> {
        let rows: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT user_id FROM users
            WHERE team_name = $1 AND is_active = true
            ORDER BY user_id
            FOR SHARE
            "#,
        )
        .bind(team.as_str())
        .fetch_all(self.conn()?)
        .await?;

        to_user_ids(rows)
    }

    // Two cascades whose teams review each other's pull requests can deadlock
    // here against the other's share locks; Postgres aborts one of them.
    async fn lock_active_members(&mut self, team: &TeamName) -> StoreResult<Vec<UserId>> {
        let rows: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT user_id FROM users
            WHERE team_name = $1 AND is_active = true
            ORDER BY user_id
            FOR UPDATE
            "#,
        )
        .bind(team.as_str())
        .fetch_all(self.conn()?)
        .await?;

        to_user_ids(rows)
    }

    async fn pr_snapshot(&mut self, pr_id: &PullRequestId) -> StoreResult<Option<PrSnapshot>> {
        let conn = self.conn()?;

        let row: Option<(String, String)> = sqlx::query_as(
            r#"
            SELECT author_id, status FROM pull_requests
            WHERE pull_request_id = $1
            FOR UPDATE
            "#,
        )
        .bind(pr_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;

        let Some((author_id, status)) = row else {
            return Ok(None);
        };

        let reviewers: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT user_id FROM pr_reviewers
            WHERE pull_request_id = $1
            ORDER BY user_id
            "#,
        )
        .bind(pr_id.as_str())
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(PrSnapshot {
            author_id: UserId::new(author_id)?,
            status: status.parse::<PrStatus>()?,
            reviewers: to_user_ids(reviewers)?.into_iter().collect(),
        }))
    }

    async fn open_prs_reviewed_by(
        &mut self,
        users: &BTreeSet<UserId>,
    ) -> StoreResult<Vec<PullRequestId>> {
        if users.is_empty() {
            return Ok(Vec::new());
        }

        // FOR UPDATE cannot be combined with DISTINCT, hence the subquery.
        let rows: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT pull_request_id FROM pull_requests
            WHERE status = 'OPEN'
              AND pull_request_id IN (
                  SELECT pull_request_id FROM pr_reviewers WHERE user_id = ANY($1)
              )
            ORDER BY pull_request_id
            FOR UPDATE
            "#,
        )
        .bind(to_strings(users))
        .fetch_all(self.conn()?)
        .await?;

        Ok(rows
            .into_iter()
            .map(PullRequestId::new)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn set_reviewers(
        &mut self,
        pr_id: &PullRequestId,
        add: &[UserId],
        remove: &[UserId],
    ) -> StoreResult<()> {
        let conn = self.conn()?;

        let row: Option<(String, String)> = sqlx::query_as(
            r#"
            SELECT author_id, status FROM pull_requests
            WHERE pull_request_id = $1
            FOR UPDATE
            "#,
        )
        .bind(pr_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;

        let Some((author_id, status)) = row else {
            return Err(StoreError::NotFound(format!("Pull request not found: {}", pr_id)));
        };

        if status.parse::<PrStatus>()?.is_merged() {
            return Err(StoreError::InvariantViolation(
                DomainError::Frozen(pr_id.to_string()).to_string(),
            ));
        }

        if let Some(author) = add.iter().find(|id| id.as_str() == author_id) {
            return Err(StoreError::InvariantViolation(
                DomainError::AuthorAsReviewer(author.to_string()).to_string(),
            ));
        }

        if !remove.is_empty() {
            let removed = sqlx::query(
                r#"
                DELETE FROM pr_reviewers
                WHERE pull_request_id = $1 AND user_id = ANY($2)
                "#,
            )
            .bind(pr_id.as_str())
            .bind(to_strings(remove))
            .execute(&mut *conn)
            .await?
            .rows_affected();

            if removed != remove.len() as u64 {
                return Err(StoreError::InvariantViolation(format!(
                    "Pull request {} lost a reviewer that was not assigned",
                    pr_id
                )));
            }
        }

        for reviewer in add {
            sqlx::query(
                r#"
                INSERT INTO pr_reviewers (pull_request_id, user_id) VALUES ($1, $2)
                "#,
            )
            .bind(pr_id.as_str())
            .bind(reviewer.as_str())
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::InvariantViolation(format!(
                        "User {} already reviews pull request {}",
                        reviewer, pr_id
                    ))
                } else {
                    StoreError::Database(e)
                }
            })?;
        }

        Ok(())
    }

    async fn set_users_inactive(&mut self, users: &BTreeSet<UserId>) -> StoreResult<u64> {
        if users.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE users SET is_active = false
            WHERE user_id = ANY($1) AND is_active = true
            "#,
        )
        .bind(to_strings(users))
        .execute(self.conn()?)
        .await?;

        Ok(result.rows_affected())
    }

    async fn insert_pull_request(&mut self, pr: &PullRequest) -> StoreResult<()> {
        let conn = self.conn()?;

        sqlx::query(
            r#"
            INSERT INTO pull_requests
                (pull_request_id, pull_request_name, author_id, status, created_at, merged_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(pr.id().as_str())
        .bind(pr.name())
        .bind(pr.author_id().as_str())
        .bind(pr.status().as_str())
        .bind(pr.created_at())
        .bind(pr.merged_at())
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("Pull request already exists: {}", pr.id()))
            } else {
                StoreError::Database(e)
            }
        })?;

        for reviewer in pr.reviewers() {
            sqlx::query(
                r#"
                INSERT INTO pr_reviewers (pull_request_id, user_id) VALUES ($1, $2)
                "#,
            )
            .bind(pr.id().as_str())
            .bind(reviewer.as_str())
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    async fn pull_request(&mut self, pr_id: &PullRequestId) -> StoreResult<Option<PullRequest>> {
        load_pull_request(self.conn()?, pr_id).await
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let tx = self.tx.take().ok_or(StoreError::TransactionFinished)?;
        tx.commit().await?;
        Ok(())
    }
}
