use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use super::selector::select_candidates;
use crate::domain::pull_request::MAX_REVIEWERS;
use crate::domain::repositories::{StoreResult, StoreTx};
use crate::domain::user::UserId;

/// Uniformly random subset of at most `MAX_REVIEWERS` candidates
///
/// Shuffles the whole list and keeps the prefix, so every ordered pair is
/// equally likely.
pub fn pick_reviewers<R: Rng + ?Sized>(mut candidates: Vec<UserId>, rng: &mut R) -> Vec<UserId> {
    candidates.shuffle(rng);
    candidates.truncate(MAX_REVIEWERS);
    candidates
}

/// Choose reviewers for a new pull request by `author_id`
///
/// Reviewers come from the author's team, are active, and never include the
/// author. An author without a team, or a team with fewer than two other
/// active members, gets fewer reviewers; that is not an error.
pub async fn assign_reviewers<R: Rng + Send>(
    tx: &mut dyn StoreTx,
    rng: &mut R,
    author_id: &UserId,
) -> StoreResult<Vec<UserId>> {
    let Some(team) = tx.user_team(author_id).await? else {
        tracing::debug!(author = %author_id, "Author has no team, assigning no reviewers");
        return Ok(Vec::new());
    };

    let exclude = BTreeSet::from([author_id.clone()]);
    let candidates = select_candidates(tx, &team, &exclude).await?;

    Ok(pick_reviewers(candidates, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ids(raw: &[&str]) -> Vec<UserId> {
        raw.iter().map(|r| UserId::new(*r).unwrap()).collect()
    }

    #[test]
    fn picks_at_most_two() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked = pick_reviewers(ids(&["u1", "u2", "u3", "u4"]), &mut rng);

        assert_eq!(picked.len(), 2);
        assert_ne!(picked[0], picked[1]);
    }

    #[test]
    fn single_candidate_is_picked() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_reviewers(ids(&["u1"]), &mut rng), ids(&["u1"]));
    }

    #[test]
    fn no_candidates_pick_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(pick_reviewers(Vec::new(), &mut rng).is_empty());
    }

    #[test]
    fn same_seed_same_pick() {
        let pool = ids(&["u1", "u2", "u3", "u4", "u5"]);
        let first = pick_reviewers(pool.clone(), &mut StdRng::seed_from_u64(99));
        let second = pick_reviewers(pool, &mut StdRng::seed_from_u64(99));
        assert_eq!(first, second);
    }

    #[test]
    fn every_candidate_gets_picked_eventually() {
        let pool = ids(&["u1", "u2", "u3"]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = BTreeSet::new();

        for _ in 0..200 {
            seen.extend(pick_reviewers(pool.clone(), &mut rng));
        }

        assert_eq!(seen.len(), 3);
    }
}
