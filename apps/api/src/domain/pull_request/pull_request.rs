use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::value_objects::{PrStatus, PullRequestId};
use crate::domain::errors::DomainError;
use crate::domain::user::UserId;

/// Upper bound on reviewers picked when a pull request is opened
pub const MAX_REVIEWERS: usize = 2;

/// PullRequest aggregate root
///
/// # Invariants
/// - The author never appears among the reviewers
/// - A reviewer appears at most once (the set type guarantees it)
/// - At most `MAX_REVIEWERS` reviewers at creation; later repairs may only
///   keep or shrink that count
/// - Status only moves Open -> Merged and `merged_at` is set once
/// - The reviewer set is frozen after merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    id: PullRequestId,
    name: String,
    author_id: UserId,
    status: PrStatus,
    reviewers: BTreeSet<UserId>,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Opens a new pull request with an already chosen reviewer set
    ///
    /// # Returns
    /// * `Ok(PullRequest)` - Open pull request stamped with the current time
    /// * `Err(DomainError)` - If the author is a reviewer, a reviewer repeats,
    ///   or more than `MAX_REVIEWERS` are given
    pub fn open(
        id: PullRequestId,
        name: impl Into<String>,
        author_id: UserId,
        reviewers: Vec<UserId>,
    ) -> Result<Self, DomainError> {
        if reviewers.len() > MAX_REVIEWERS {
            return Err(DomainError::TooManyReviewers {
                max: MAX_REVIEWERS,
                got: reviewers.len(),
            });
        }

        let mut set = BTreeSet::new();
        for reviewer in reviewers {
            if reviewer == author_id {
                return Err(DomainError::AuthorAsReviewer(author_id.to_string()));
            }
            if set.contains(&reviewer) {
                return Err(DomainError::DuplicateReviewer(reviewer.to_string()));
            }
            set.insert(reviewer);
        }

        Ok(Self {
            id,
            name: name.into(),
            author_id,
            status: PrStatus::Open,
            reviewers: set,
            created_at: Utc::now(),
            merged_at: None,
        })
    }

    /// Marks the pull request merged
    ///
    /// Idempotent: merging an already merged pull request leaves status and
    /// `merged_at` untouched and returns `false`.
    pub fn merge(&mut self, at: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(PrStatus::Merged) {
            return false;
        }

        self.status = PrStatus::Merged;
        self.merged_at = Some(at);
        true
    }

    /// Removes a reviewer, returning whether they were assigned
    pub fn remove_reviewer(&mut self, reviewer: &UserId) -> Result<bool, DomainError> {
        self.ensure_open()?;
        Ok(self.reviewers.remove(reviewer))
    }

    /// Adds a reviewer
    ///
    /// Unlike creation this does not cap the set size; the policies decide
    /// how many reviewers a repair may add.
    pub fn add_reviewer(&mut self, reviewer: UserId) -> Result<(), DomainError> {
        self.ensure_open()?;
        if reviewer == self.author_id {
            return Err(DomainError::AuthorAsReviewer(reviewer.to_string()));
        }
        if self.reviewers.contains(&reviewer) {
            return Err(DomainError::DuplicateReviewer(reviewer.to_string()));
        }
        self.reviewers.insert(reviewer);
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.status.is_merged() {
            return Err(DomainError::Frozen(self.id.to_string()));
        }
        Ok(())
    }

    // ===== Getters =====

    pub fn id(&self) -> &PullRequestId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn author_id(&self) -> &UserId {
        &self.author_id
    }

    pub fn status(&self) -> PrStatus {
        self.status
    }

    /// Assigned reviewers ordered by user id
    pub fn reviewers(&self) -> &BTreeSet<UserId> {
        &self.reviewers
    }

    pub fn has_reviewer(&self, user_id: &UserId) -> bool {
        self.reviewers.contains(user_id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn merged_at(&self) -> Option<DateTime<Utc>> {
        self.merged_at
    }

    /// Condensed view used by review-list queries
    pub fn to_short(&self) -> PullRequestShort {
        PullRequestShort {
            id: self.id.clone(),
            name: self.name.clone(),
            author_id: self.author_id.clone(),
            status: self.status,
        }
    }

    /// Reconstructs a PullRequest from persistence layer data
    ///
    /// Only to be used by store implementations.
    pub fn from_persistence(
        id: PullRequestId,
        name: String,
        author_id: UserId,
        status: PrStatus,
        reviewers: BTreeSet<UserId>,
        created_at: DateTime<Utc>,
        merged_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            name,
            author_id,
            status,
            reviewers,
            created_at,
            merged_at,
        }
    }
}

/// Pull request summary without reviewers or timestamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestShort {
    pub id: PullRequestId,
    pub name: String,
    pub author_id: UserId,
    pub status: PrStatus,
}
