use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::assignment::assign_reviewers;
use super::cascade::{self, CascadeReport};
use super::reassignment::{self, ReassignOutcome};
use crate::domain::pull_request::{PullRequest, PullRequestId};
use crate::domain::repositories::{MembershipStore, StoreError, StoreResult};
use crate::domain::team::TeamName;
use crate::domain::user::UserId;

/// Result of opening a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(PullRequest),
    /// The pull request id is already used
    AlreadyExists,
    AuthorNotFound,
}

/// Entry points of the reviewer engine
///
/// Each call runs in its own store transaction and commits only when the
/// policy finished without a store error. Refusals (`NoCandidate`,
/// `AlreadyMerged`, ...) leave nothing to commit.
///
/// Randomness comes from a master `StdRng` owned by the service. Every call
/// seeds its own generator from it, so a seeded service replays the same
/// sequence of picks for the same sequence of calls.
pub struct ReviewerService {
    store: Arc<dyn MembershipStore>,
    rng: Mutex<StdRng>,
}

impl ReviewerService {
    /// Creates a service with an entropy-seeded random source
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a service whose picks are reproducible
    pub fn with_seed(store: Arc<dyn MembershipStore>, seed: u64) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn request_rng(&self) -> StdRng {
        let mut master = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        StdRng::seed_from_u64(master.gen())
    }

    /// Open a pull request and assign up to two reviewers from the author's team
    #[tracing::instrument(skip(self, name))]
    pub async fn create_pull_request(
        &self,
        id: PullRequestId,
        name: String,
        author_id: UserId,
    ) -> StoreResult<CreateOutcome> {
        let mut rng = self.request_rng();
        let mut tx = self.store.begin().await?;

        if tx.pr_snapshot(&id).await?.is_some() {
            return Ok(CreateOutcome::AlreadyExists);
        }

        if !tx.user_exists(&author_id).await? {
            return Ok(CreateOutcome::AuthorNotFound);
        }

        let reviewers = assign_reviewers(tx.as_mut(), &mut rng, &author_id).await?;
        let pull_request = PullRequest::open(id, name, author_id, reviewers)
            .map_err(|e| StoreError::InvariantViolation(e.to_string()))?;

        match tx.insert_pull_request(&pull_request).await {
            Ok(()) => {}
            // Lost a race against a concurrent creation with the same id.
            Err(StoreError::Conflict(_)) => return Ok(CreateOutcome::AlreadyExists),
            Err(e) => return Err(e),
        }

        // Read back so the caller sees stored values (timestamp precision).
        let stored = tx.pull_request(pull_request.id()).await?.ok_or_else(|| {
            StoreError::InvariantViolation(format!(
                "pull request {} missing right after insert",
                pull_request.id()
            ))
        })?;

        tx.commit().await?;

        tracing::info!(
            pr_id = %stored.id(),
            reviewers = stored.reviewers().len(),
            "Pull request created"
        );

        Ok(CreateOutcome::Created(stored))
    }

    /// Swap one reviewer for a random active teammate of theirs
    #[tracing::instrument(skip(self))]
    pub async fn reassign_reviewer(
        &self,
        pr_id: &PullRequestId,
        old_reviewer: &UserId,
    ) -> StoreResult<ReassignOutcome> {
        let mut rng = self.request_rng();
        let mut tx = self.store.begin().await?;

        let outcome = reassignment::reassign(tx.as_mut(), &mut rng, pr_id, old_reviewer).await?;

        if let ReassignOutcome::Reassigned { replaced_by, .. } = &outcome {
            tx.commit().await?;
            tracing::info!(
                pr_id = %pr_id,
                old_reviewer = %old_reviewer,
                new_reviewer = %replaced_by,
                "Reviewer reassigned"
            );
        }

        Ok(outcome)
    }

    /// Deactivate a whole team and repair the open pull requests it reviewed
    ///
    /// All or nothing: on any store error no user is deactivated and no
    /// reviewer changes.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate_team(&self, team: &TeamName) -> StoreResult<CascadeReport> {
        let mut rng = self.request_rng();
        let mut tx = self.store.begin().await?;

        let report = match cascade::deactivate_team(tx.as_mut(), &mut rng, team).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(team = %team, error = %e, "Team deactivation rolled back");
                return Err(e);
            }
        };

        tx.commit().await?;

        tracing::info!(
            team = %team,
            deactivated_users = report.deactivated_users,
            reassigned_prs = report.reassigned_prs,
            "Team deactivated"
        );

        Ok(report)
    }
}
