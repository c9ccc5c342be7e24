//! Candidate selection.
//!
//! A candidate is an active member of a given team who is not in the
//! exclusion set. Results are ordered by user id so that a seeded random
//! source produces the same picks on every run.

use std::collections::BTreeSet;

use crate::domain::repositories::{StoreResult, StoreTx};
use crate::domain::team::TeamName;
use crate::domain::user::UserId;

/// Set difference of `members` and `exclude`, ordered and de-duplicated
pub fn candidates_excluding(members: &[UserId], exclude: &BTreeSet<UserId>) -> Vec<UserId> {
    members
        .iter()
        .filter(|id| !exclude.contains(*id))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Active members of `team` that are not in `exclude`
///
/// An unknown team, a team without active members, or a fully excluded
/// team all yield an empty list.
pub async fn select_candidates(
    tx: &mut dyn StoreTx,
    team: &TeamName,
    exclude: &BTreeSet<UserId>,
) -> StoreResult<Vec<UserId>> {
    let members = tx.active_members(team).await?;
    let candidates = candidates_excluding(&members, exclude);

    tracing::debug!(
        team = %team,
        active = members.len(),
        candidates = candidates.len(),
        "Selected review candidates"
    );

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<UserId> {
        raw.iter().map(|r| UserId::new(*r).unwrap()).collect()
    }

    fn set(raw: &[&str]) -> BTreeSet<UserId> {
        ids(raw).into_iter().collect()
    }

    #[test]
    fn excludes_listed_users() {
        let result = candidates_excluding(&ids(&["u1", "u2", "u3"]), &set(&["u2"]));
        assert_eq!(result, ids(&["u1", "u3"]));
    }

    #[test]
    fn empty_members_yield_empty() {
        assert!(candidates_excluding(&[], &set(&["u1"])).is_empty());
    }

    #[test]
    fn all_excluded_yields_empty() {
        let result = candidates_excluding(&ids(&["u1", "u2"]), &set(&["u1", "u2"]));
        assert!(result.is_empty());
    }

    #[test]
    fn result_is_sorted_and_unique() {
        let result = candidates_excluding(&ids(&["u3", "u1", "u3", "u2"]), &BTreeSet::new());
        assert_eq!(result, ids(&["u1", "u2", "u3"]));
    }

    #[test]
    fn excluding_unknown_ids_changes_nothing() {
        let result = candidates_excluding(&ids(&["u1"]), &set(&["ghost"]));
        assert_eq!(result, ids(&["u1"]));
    }
}
