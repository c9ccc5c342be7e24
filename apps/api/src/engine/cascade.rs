//! Team deactivation cascade.
//!
//! Deactivating a team flips every active member to inactive and repairs
//! every open pull request that had one of them as a reviewer. The caller
//! runs the whole cascade inside one store transaction, so readers observe
//! either none of it or all of it.

use std::collections::BTreeSet;

use rand::Rng;
use serde::Serialize;

use super::selector::select_candidates;
use crate::domain::pull_request::PullRequestId;
use crate::domain::repositories::{StoreError, StoreResult, StoreTx};
use crate::domain::team::TeamName;
use crate::domain::user::UserId;

/// Counts reported by a completed cascade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub deactivated_users: usize,
    /// Pull requests that got at least one replacement reviewer
    pub reassigned_prs: usize,
}

/// What happened to one pull request during repair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairOutcome {
    /// Lost slots given to a new reviewer
    pub replaced: usize,
    /// Lost slots left empty for lack of candidates
    pub vacated: usize,
}

impl RepairOutcome {
    /// Counting rule for `CascadeReport::reassigned_prs`
    ///
    /// A pull request counts once any slot was refilled, even if others were
    /// left vacant.
    pub fn counts_as_reassigned(&self) -> bool {
        self.replaced > 0
    }
}

/// Deactivate every active member of `team` and repair affected pull requests
///
/// Returns `(0, 0)` without writing anything when the team has no active
/// members, including when a concurrent cascade on the same team already
/// committed.
pub async fn deactivate_team<R: Rng + Send>(
    tx: &mut dyn StoreTx,
    rng: &mut R,
    team: &TeamName,
) -> StoreResult<CascadeReport> {
    let deactivated: BTreeSet<UserId> = tx.lock_active_members(team).await?.into_iter().collect();

    if deactivated.is_empty() {
        tracing::info!(team = %team, "No active members to deactivate");
        return Ok(CascadeReport::default());
    }

    let flipped = tx.set_users_inactive(&deactivated).await?;
    if flipped != deactivated.len() as u64 {
        return Err(StoreError::InvariantViolation(format!(
            "expected to deactivate {} users in team {}, changed {}",
            deactivated.len(),
            team,
            flipped
        )));
    }

    let affected = tx.open_prs_reviewed_by(&deactivated).await?;
    tracing::debug!(
        team = %team,
        deactivated = deactivated.len(),
        affected_prs = affected.len(),
        "Repairing pull requests after deactivation"
    );

    let mut reassigned_prs = 0;
    for pr_id in &affected {
        let outcome = repair_pull_request(tx, rng, pr_id, &deactivated).await?;
        if outcome.counts_as_reassigned() {
            reassigned_prs += 1;
        }
    }

    Ok(CascadeReport {
        deactivated_users: deactivated.len(),
        reassigned_prs,
    })
}

/// Replace the reviewers of `pr_id` that are in `deactivated`
///
/// Candidates come from the author's current team, excluding the author and
/// every reviewer on the pull request, computed once up front. Each lost slot
/// takes a fresh random candidate out of that pool; once the pool runs dry
/// the remaining lost reviewers are removed without a substitute.
pub async fn repair_pull_request<R: Rng + Send>(
    tx: &mut dyn StoreTx,
    rng: &mut R,
    pr_id: &PullRequestId,
    deactivated: &BTreeSet<UserId>,
) -> StoreResult<RepairOutcome> {
    let Some(snapshot) = tx.pr_snapshot(pr_id).await? else {
        return Ok(RepairOutcome::default());
    };

    // Merged pull requests keep their history.
    if snapshot.status.is_merged() {
        return Ok(RepairOutcome::default());
    }

    let to_replace: Vec<UserId> = snapshot
        .reviewers
        .intersection(deactivated)
        .cloned()
        .collect();
    if to_replace.is_empty() {
        return Ok(RepairOutcome::default());
    }

    let mut pool = match tx.user_team(&snapshot.author_id).await? {
        Some(author_team) => {
            let mut exclude = snapshot.reviewers.clone();
            exclude.insert(snapshot.author_id.clone());
            select_candidates(tx, &author_team, &exclude).await?
        }
        None => Vec::new(),
    };

    let mut outcome = RepairOutcome::default();
    let mut added = Vec::new();

    for _ in &to_replace {
        if pool.is_empty() {
            outcome.vacated += 1;
            continue;
        }
        let index = rng.gen_range(0..pool.len());
        added.push(pool.remove(index));
        outcome.replaced += 1;
    }

    tx.set_reviewers(pr_id, &added, &to_replace).await?;

    tracing::debug!(
        pr_id = %pr_id,
        replaced = outcome.replaced,
        vacated = outcome.vacated,
        "Repaired pull request reviewers"
    );

    Ok(outcome)
}
