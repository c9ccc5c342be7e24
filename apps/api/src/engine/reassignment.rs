use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use super::selector::candidates_excluding;
use crate::domain::pull_request::{PullRequest, PullRequestId};
use crate::domain::repositories::{StoreError, StoreResult, StoreTx};
use crate::domain::user::UserId;

/// Result of a single reviewer swap
///
/// Only `Reassigned` changes the reviewer set. The other variants are
/// expected refusals, not faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassignOutcome {
    /// `old` was replaced by `replaced_by`; `pull_request` is the state
    /// written by this unit
    Reassigned {
        replaced_by: UserId,
        pull_request: PullRequest,
    },
    PullRequestNotFound,
    AlreadyMerged,
    /// The reviewer to replace is not on the pull request
    NotAssigned,
    /// Nobody in the departing reviewer's team can take over
    NoCandidate,
}

/// Uniformly random replacement, `None` when there are no candidates
pub fn pick_replacement<R: Rng + ?Sized>(candidates: &[UserId], rng: &mut R) -> Option<UserId> {
    candidates.choose(rng).cloned()
}

/// Replace `old_reviewer` on `pr_id` with a random active teammate of theirs
///
/// Preconditions (pull request exists, is open, `old_reviewer` is assigned)
/// are re-checked here under the pull request lock, so a concurrent merge,
/// cascade or second swap either happened entirely before this one or
/// happens entirely after it.
///
/// The replacement is drawn from the old reviewer's team, excluding the
/// author and everyone already assigned.
pub async fn reassign<R: Rng + Send>(
    tx: &mut dyn StoreTx,
    rng: &mut R,
    pr_id: &PullRequestId,
    old_reviewer: &UserId,
) -> StoreResult<ReassignOutcome> {
    // Candidate rows are share-locked before the pull request row so that
    // swaps and cascades take their locks in the same order.
    let members = match tx.user_team(old_reviewer).await? {
        Some(team) => tx.active_members(&team).await?,
        None => Vec::new(),
    };

    let Some(snapshot) = tx.pr_snapshot(pr_id).await? else {
        return Ok(ReassignOutcome::PullRequestNotFound);
    };

    if snapshot.status.is_merged() {
        return Ok(ReassignOutcome::AlreadyMerged);
    }

    if !snapshot.reviewers.contains(old_reviewer) {
        return Ok(ReassignOutcome::NotAssigned);
    }

    let mut exclude: BTreeSet<UserId> = snapshot.reviewers.clone();
    exclude.insert(snapshot.author_id.clone());
    let candidates = candidates_excluding(&members, &exclude);

    let Some(replacement) = pick_replacement(&candidates, rng) else {
        tracing::warn!(
            pr_id = %pr_id,
            old_reviewer = %old_reviewer,
            "No replacement candidate available"
        );
        return Ok(ReassignOutcome::NoCandidate);
    };

    tx.set_reviewers(
        pr_id,
        std::slice::from_ref(&replacement),
        std::slice::from_ref(old_reviewer),
    )
    .await?;

    let pull_request = tx.pull_request(pr_id).await?.ok_or_else(|| {
        StoreError::InvariantViolation(format!("pull request {} missing after swap", pr_id))
    })?;

    Ok(ReassignOutcome::Reassigned {
        replaced_by: replacement,
        pull_request,
    })
}
