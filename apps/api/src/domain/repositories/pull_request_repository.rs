use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use super::errors::StoreResult;
use crate::domain::pull_request::{PullRequest, PullRequestId, PullRequestShort};
use crate::domain::user::UserId;

/// Aggregate counters over pull requests and review assignments
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewStatistics {
    pub total_prs: i64,
    pub open_prs: i64,
    pub merged_prs: i64,
    /// Assignment count keyed by reviewer username
    pub reviewer_assignments: BTreeMap<String, i64>,
    /// Authored pull request count keyed by username
    pub prs_by_author: BTreeMap<String, i64>,
    pub average_reviewers_per_pr: f64,
}

impl ReviewStatistics {
    /// Average of `total_reviewers` over `total_prs`, zero when there are none
    pub fn average(total_reviewers: i64, total_prs: i64) -> f64 {
        if total_prs > 0 {
            total_reviewers as f64 / total_prs as f64
        } else {
            0.0
        }
    }
}

/// Repository trait for pull request reads and the merge transition
#[async_trait]
pub trait PullRequestRepository: Send + Sync {
    /// Find a pull request with its reviewers
    async fn find_by_id(&self, id: &PullRequestId) -> StoreResult<Option<PullRequest>>;

    /// Merge a pull request, returning its state afterwards
    ///
    /// Idempotent; `Ok(None)` when the pull request does not exist.
    async fn merge(&self, id: &PullRequestId) -> StoreResult<Option<PullRequest>>;

    /// Pull requests the user is assigned to review, ordered by id
    async fn find_by_reviewer(&self, user_id: &UserId) -> StoreResult<Vec<PullRequestShort>>;

    /// Counters over all pull requests
    async fn statistics(&self) -> StoreResult<ReviewStatistics>;
}
