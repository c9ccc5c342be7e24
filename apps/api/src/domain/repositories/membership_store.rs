use std::collections::BTreeSet;

use async_trait::async_trait;

use super::errors::StoreResult;
use crate::domain::pull_request::{PrStatus, PullRequest, PullRequestId};
use crate::domain::team::TeamName;
use crate::domain::user::UserId;

/// The parts of a pull request the assignment policies decide on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrSnapshot {
    pub author_id: UserId,
    pub status: PrStatus,
    pub reviewers: BTreeSet<UserId>,
}

impl From<&PullRequest> for PrSnapshot {
    fn from(pr: &PullRequest) -> Self {
        Self {
            author_id: pr.author_id().clone(),
            status: pr.status(),
            reviewers: pr.reviewers().clone(),
        }
    }
}

/// Transactional store contract consumed by the reviewer engine
///
/// Every engine entry point runs inside one `StoreTx`. Work done through the
/// handle becomes visible to other transactions only on `commit`; dropping
/// the handle without committing discards it.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Open a transaction
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;
}

/// A scoped unit of work against the membership store
///
/// Implementations must give the unit all-or-nothing visibility and must
/// serialize conflicting units: a pull request read through `pr_snapshot`
/// stays locked against other writers until the unit ends, and members
/// returned by `lock_active_members` stay locked against both readers that
/// select candidates and other writers.
#[async_trait]
pub trait StoreTx: Send {
    /// Team of a user; `None` if the user has no team or does not exist
    async fn user_team(&mut self, user_id: &UserId) -> StoreResult<Option<TeamName>>;

    /// Whether the user exists
    async fn user_exists(&mut self, user_id: &UserId) -> StoreResult<bool>;

    /// Active members of a team ordered by id; empty for an unknown team
    ///
    /// Holds a shared lock on the returned rows so a concurrent cascade
    /// cannot deactivate them until this unit ends.
    async fn active_members(&mut self, team: &TeamName) -> StoreResult<Vec<UserId>>;

    /// Active members of a team ordered by id, locked exclusively
    async fn lock_active_members(&mut self, team: &TeamName) -> StoreResult<Vec<UserId>>;

    /// Lock a pull request and read author, status and reviewers
    async fn pr_snapshot(&mut self, pr_id: &PullRequestId) -> StoreResult<Option<PrSnapshot>>;

    /// Open pull requests with at least one reviewer in `users`, ordered by id
    async fn open_prs_reviewed_by(
        &mut self,
        users: &BTreeSet<UserId>,
    ) -> StoreResult<Vec<PullRequestId>>;

    /// Remove then add reviewers on a pull request
    ///
    /// Removing an unassigned reviewer or adding an assigned one is an
    /// `InvariantViolation`.
    async fn set_reviewers(
        &mut self,
        pr_id: &PullRequestId,
        add: &[UserId],
        remove: &[UserId],
    ) -> StoreResult<()>;

    /// Flip the given users to inactive, returning the number of rows changed
    async fn set_users_inactive(&mut self, users: &BTreeSet<UserId>) -> StoreResult<u64>;

    /// Insert a new pull request with its reviewers
    ///
    /// Fails with `StoreError::Conflict` when the id is already used.
    async fn insert_pull_request(&mut self, pr: &PullRequest) -> StoreResult<()>;

    /// Full pull request read, as seen by this unit
    async fn pull_request(&mut self, pr_id: &PullRequestId) -> StoreResult<Option<PullRequest>>;

    /// Make the unit's writes visible; the handle is unusable afterwards
    async fn commit(&mut self) -> StoreResult<()>;
}
