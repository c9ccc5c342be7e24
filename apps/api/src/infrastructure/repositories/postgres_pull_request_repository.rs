use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::pull_request::{PrStatus, PullRequest, PullRequestId, PullRequestShort};
use crate::domain::repositories::{PullRequestRepository, ReviewStatistics, StoreResult};
use crate::domain::user::UserId;

type PullRequestRow = (String, String, String, String, DateTime<Utc>, Option<DateTime<Utc>>);

/// Load a pull request and its reviewers over one connection
///
/// Shared by the repository and the transactional store so both see the
/// same shape.
pub(crate) async fn load_pull_request(
    conn: &mut PgConnection,
    id: &PullRequestId,
) -> StoreResult<Option<PullRequest>> {
    let row: Option<PullRequestRow> = sqlx::query_as(
        r#"
        SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
        FROM pull_requests
        WHERE pull_request_id = $1
        "#,
    )
    .bind(id.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    let Some((pull_request_id, name, author_id, status, created_at, merged_at)) = row else {
        return Ok(None);
    };

    let reviewer_ids: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT user_id FROM pr_reviewers
        WHERE pull_request_id = $1
        ORDER BY user_id
        "#,
    )
    .bind(id.as_str())
    .fetch_all(&mut *conn)
    .await?;

    let reviewers = reviewer_ids
        .into_iter()
        .map(UserId::new)
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(Some(PullRequest::from_persistence(
        PullRequestId::new(pull_request_id)?,
        name,
        UserId::new(author_id)?,
        status.parse::<PrStatus>()?,
        reviewers,
        created_at,
        merged_at,
    )))
}

/// PostgreSQL implementation of PullRequestRepository
pub struct PostgresPullRequestRepository {
    pool: PgPool,
}

impl PostgresPullRequestRepository {
    /// Creates a new PostgresPullRequestRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PullRequestRepository for PostgresPullRequestRepository {
    async fn find_by_id(&self, id: &PullRequestId) -> StoreResult<Option<PullRequest>> {
        let mut conn = self.pool.acquire().await?;
        load_pull_request(&mut conn, id).await
    }

    async fn merge(&self, id: &PullRequestId) -> StoreResult<Option<PullRequest>> {
        let mut tx = self.pool.begin().await?;

        let status: Option<String> = sqlx::query_scalar(
            r#"
            SELECT status FROM pull_requests
            WHERE pull_request_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(status) = status else {
            return Ok(None);
        };

        // Merging twice keeps the first merge timestamp.
        if !status.parse::<PrStatus>()?.is_merged() {
            sqlx::query(
                r#"
                UPDATE pull_requests
                SET status = 'MERGED', merged_at = NOW()
                WHERE pull_request_id = $1
                "#,
            )
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        }

        let merged = load_pull_request(&mut tx, id).await?;
        tx.commit().await?;

        Ok(merged)
    }

    async fn find_by_reviewer(&self, user_id: &UserId) -> StoreResult<Vec<PullRequestShort>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT pr.pull_request_id, pr.pull_request_name, pr.author_id, pr.status
            FROM pull_requests pr
            JOIN pr_reviewers r ON r.pull_request_id = pr.pull_request_id
            WHERE r.user_id = $1
            ORDER BY pr.pull_request_id
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, name, author_id, status)| {
                Ok(PullRequestShort {
                    id: PullRequestId::new(id)?,
                    name,
                    author_id: UserId::new(author_id)?,
                    status: status.parse()?,
                })
            })
            .collect()
    }

    async fn statistics(&self) -> StoreResult<ReviewStatistics> {
        let (total_prs, open_prs, merged_prs): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'OPEN'),
                COUNT(*) FILTER (WHERE status = 'MERGED')
            FROM pull_requests
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let reviewer_rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT COALESCE(u.username, r.user_id), COUNT(*)
            FROM pr_reviewers r
            LEFT JOIN users u ON u.user_id = r.user_id
            GROUP BY 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let author_rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT COALESCE(u.username, pr.author_id), COUNT(*)
            FROM pull_requests pr
            LEFT JOIN users u ON u.user_id = pr.author_id
            GROUP BY 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let total_reviewers: i64 = reviewer_rows.iter().map(|(_, count)| count).sum();

        Ok(ReviewStatistics {
            total_prs,
            open_prs,
            merged_prs,
            reviewer_assignments: reviewer_rows.into_iter().collect(),
            prs_by_author: author_rows.into_iter().collect(),
            average_reviewers_per_pr: ReviewStatistics::average(total_reviewers, total_prs),
        })
    }
}
