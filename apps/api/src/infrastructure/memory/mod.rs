//! In-memory implementation of every store port.
//!
//! All state lives behind one async mutex. A transaction holds the lock for
//! its whole lifetime and works on a private copy that replaces the shared
//! state on commit, so units are serialized and all-or-nothing. State is
//! lost on restart.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::pull_request::{PrStatus, PullRequest, PullRequestId, PullRequestShort};
use crate::domain::repositories::{
    MembershipStore, PrSnapshot, PullRequestRepository, ReviewStatistics, StoreError,
    StoreResult, StoreTx, TeamRepository, User, UserRepository,
};
use crate::domain::team::{Team, TeamMember, TeamName};
use crate::domain::user::UserId;

#[derive(Debug, Clone)]
struct UserRecord {
    username: String,
    team_name: Option<TeamName>,
    is_active: bool,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    teams: BTreeSet<TeamName>,
    users: BTreeMap<UserId, UserRecord>,
    pull_requests: BTreeMap<PullRequestId, PullRequest>,
}

impl MemoryState {
    fn user(&self, id: &UserId) -> Option<User> {
        self.users.get(id).map(|record| User {
            id: id.clone(),
            username: record.username.clone(),
            team_name: record.team_name.clone(),
            is_active: record.is_active,
        })
    }

    fn active_members(&self, team: &TeamName) -> Vec<UserId> {
        self.users
            .iter()
            .filter(|(_, record)| {
                record.is_active && record.team_name.as_ref() == Some(team)
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn username_or_id(&self, id: &UserId) -> String {
        self.users
            .get(id)
            .map(|record| record.username.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

/// Shared in-memory store
///
/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamRepository for InMemoryStore {
    async fn create(&self, team: &Team) -> StoreResult<()> {
        let mut state = self.state.lock().await;

        if state.teams.contains(team.name()) {
            return Err(StoreError::Conflict(format!(
                "Team already exists: {}",
                team.name()
            )));
        }

        state.teams.insert(team.name().clone());
        for member in team.members() {
            state.users.insert(
                member.user_id.clone(),
                UserRecord {
                    username: member.username.clone(),
                    team_name: Some(team.name().clone()),
                    is_active: member.is_active,
                },
            );
        }

        Ok(())
    }

    async fn find_by_name(&self, name: &TeamName) -> StoreResult<Option<Team>> {
        let state = self.state.lock().await;

        if !state.teams.contains(name) {
            return Ok(None);
        }

        let members = state
            .users
            .iter()
            .filter(|(_, record)| record.team_name.as_ref() == Some(name))
            .map(|(id, record)| {
                TeamMember::new(id.clone(), record.username.clone(), record.is_active)
            })
            .collect();

        Ok(Some(Team::from_persistence(name.clone(), members)))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.user(id))
    }

    async fn set_is_active(&self, id: &UserId, is_active: bool) -> StoreResult<User> {
        let mut state = self.state.lock().await;

        let record = state
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("User not found: {}", id)))?;
        record.is_active = is_active;

        state
            .user(id)
            .ok_or_else(|| StoreError::NotFound(format!("User not found: {}", id)))
    }
}

#[async_trait]
impl PullRequestRepository for InMemoryStore {
    async fn find_by_id(&self, id: &PullRequestId) -> StoreResult<Option<PullRequest>> {
        let state = self.state.lock().await;
        Ok(state.pull_requests.get(id).cloned())
    }

    async fn merge(&self, id: &PullRequestId) -> StoreResult<Option<PullRequest>> {
        let mut state = self.state.lock().await;

        Ok(state.pull_requests.get_mut(id).map(|pr| {
            pr.merge(Utc::now());
            pr.clone()
        }))
    }

    async fn find_by_reviewer(&self, user_id: &UserId) -> StoreResult<Vec<PullRequestShort>> {
        let state = self.state.lock().await;

        Ok(state
            .pull_requests
            .values()
            .filter(|pr| pr.has_reviewer(user_id))
            .map(PullRequest::to_short)
            .collect())
    }

    async fn statistics(&self) -> StoreResult<ReviewStatistics> {
        let state = self.state.lock().await;
        let mut stats = ReviewStatistics::default();
        let mut total_reviewers = 0;

        for pr in state.pull_requests.values() {
            stats.total_prs += 1;
            match pr.status() {
                PrStatus::Open => stats.open_prs += 1,
                PrStatus::Merged => stats.merged_prs += 1,
            }

            *stats
                .prs_by_author
                .entry(state.username_or_id(pr.author_id()))
                .or_insert(0) += 1;

            for reviewer in pr.reviewers() {
                total_reviewers += 1;
                *stats
                    .reviewer_assignments
                    .entry(state.username_or_id(reviewer))
                    .or_insert(0) += 1;
            }
        }

        stats.average_reviewers_per_pr =
            ReviewStatistics::average(total_reviewers, stats.total_prs);

        Ok(stats)
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(InMemoryTx {
            guard: Some(guard),
            working,
        }))
    }
}

/// Transaction over the in-memory state
///
/// Dropping it without `commit` releases the lock and discards `working`.
struct InMemoryTx {
    guard: Option<OwnedMutexGuard<MemoryState>>,
    working: MemoryState,
}

impl InMemoryTx {
    fn ensure_live(&self) -> StoreResult<()> {
        match self.guard {
            Some(_) => Ok(()),
            None => Err(StoreError::TransactionFinished),
        }
    }

    fn pull_request_mut(&mut self, pr_id: &PullRequestId) -> StoreResult<&mut PullRequest> {
        self.working
            .pull_requests
            .get_mut(pr_id)
            .ok_or_else(|| StoreError::NotFound(format!("Pull request not found: {}", pr_id)))
    }
}

fn invariant(e: impl std::fmt::Display) -> StoreError {
    StoreError::InvariantViolation(e.to_string())
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn user_team(&mut self, user_id: &UserId) -> StoreResult<Option<TeamName>> {
        self.ensure_live()?;
        Ok(self
            .working
            .users
            .get(user_id)
            .and_then(|record| record.team_name.clone()))
    }

    async fn user_exists(&mut self, user_id: &UserId) -> StoreResult<bool> {
        self.ensure_live()?;
        Ok(self.working.users.contains_key(user_id))
    }

    async fn active_members(&mut self, team: &TeamName) -> StoreResult<Vec<UserId>> {
        self.ensure_live()?;
        Ok(self.working.active_members(team))
    }

    async fn lock_active_members(&mut self, team: &TeamName) -> StoreResult<Vec<UserId>> {
        // The transaction already holds the store exclusively.
        self.active_members(team).await
    }

    async fn pr_snapshot(&mut self, pr_id: &PullRequestId) -> StoreResult<Option<PrSnapshot>> {
        self.ensure_live()?;
        Ok(self.working.pull_requests.get(pr_id).map(PrSnapshot::from))
    }

    async fn open_prs_reviewed_by(
        &mut self,
        users: &BTreeSet<UserId>,
    ) -> StoreResult<Vec<PullRequestId>> {
        self.ensure_live()?;
        Ok(self
            .working
            .pull_requests
            .values()
            .filter(|pr| pr.status() == PrStatus::Open)
            .filter(|pr| pr.reviewers().iter().any(|r| users.contains(r)))
            .map(|pr| pr.id().clone())
            .collect())
    }

    async fn set_reviewers(
        &mut self,
        pr_id: &PullRequestId,
        add: &[UserId],
        remove: &[UserId],
    ) -> StoreResult<()> {
        self.ensure_live()?;
        let pr = self.pull_request_mut(pr_id)?;

        for reviewer in remove {
            if !pr.remove_reviewer(reviewer).map_err(invariant)? {
                return Err(StoreError::InvariantViolation(format!(
                    "Reviewer {} is not assigned to {}",
                    reviewer, pr_id
                )));
            }
        }
        for reviewer in add {
            pr.add_reviewer(reviewer.clone()).map_err(invariant)?;
        }

        Ok(())
    }

    async fn set_users_inactive(&mut self, users: &BTreeSet<UserId>) -> StoreResult<u64> {
        self.ensure_live()?;
        let mut changed = 0;

        for id in users {
            if let Some(record) = self.working.users.get_mut(id) {
                if record.is_active {
                    record.is_active = false;
                    changed += 1;
                }
            }
        }

        Ok(changed)
    }

    async fn insert_pull_request(&mut self, pr: &PullRequest) -> StoreResult<()> {
        self.ensure_live()?;

        if self.working.pull_requests.contains_key(pr.id()) {
            return Err(StoreError::Conflict(format!(
                "Pull request already exists: {}",
                pr.id()
            )));
        }
        if !self.working.users.contains_key(pr.author_id()) {
            return Err(StoreError::NotFound(format!(
                "Author not found: {}",
                pr.author_id()
            )));
        }

        self.working
            .pull_requests
            .insert(pr.id().clone(), pr.clone());
        Ok(())
    }

    async fn pull_request(&mut self, pr_id: &PullRequestId) -> StoreResult<Option<PullRequest>> {
        self.ensure_live()?;
        Ok(self.working.pull_requests.get(pr_id).cloned())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let mut guard = self.guard.take().ok_or(StoreError::TransactionFinished)?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        let team = Team::new(
            TeamName::new("backend").unwrap(),
            vec![
                TeamMember::new(uid("u1"), "Alice", true),
                TeamMember::new(uid("u2"), "Bob", true),
                TeamMember::new(uid("u3"), "Carol", false),
            ],
        )
        .unwrap();
        TeamRepository::create(&store, &team).await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_team_twice_conflicts() {
        let store = seeded_store().await;
        let team = Team::new(TeamName::new("backend").unwrap(), vec![]).unwrap();

        let result = TeamRepository::create(&store, &team).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn creating_team_moves_existing_member() {
        let store = seeded_store().await;
        let team = Team::new(
            TeamName::new("frontend").unwrap(),
            vec![TeamMember::new(uid("u2"), "Bobby", false)],
        )
        .unwrap();
        TeamRepository::create(&store, &team).await.unwrap();

        let user = UserRepository::find_by_id(&store, &uid("u2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.team_name, Some(TeamName::new("frontend").unwrap()));
        assert_eq!(user.username, "Bobby");
        assert!(!user.is_active);

        let backend = store
            .find_by_name(&TeamName::new("backend").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(backend.members().len(), 2);
    }

    #[tokio::test]
    async fn active_members_are_sorted_and_filtered() {
        let store = seeded_store().await;
        let mut tx = store.begin().await.unwrap();

        let members = tx
            .active_members(&TeamName::new("backend").unwrap())
            .await
            .unwrap();
        assert_eq!(members, vec![uid("u1"), uid("u2")]);

        let none = tx
            .active_members(&TeamName::new("ghosts").unwrap())
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = seeded_store().await;

        {
            let mut tx = store.begin().await.unwrap();
            let users = BTreeSet::from([uid("u1")]);
            assert_eq!(tx.set_users_inactive(&users).await.unwrap(), 1);
        }

        let user = UserRepository::find_by_id(&store, &uid("u1"))
            .await
            .unwrap()
            .unwrap();
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn committed_transaction_is_visible() {
        let store = seeded_store().await;

        let mut tx = store.begin().await.unwrap();
        tx.set_users_inactive(&BTreeSet::from([uid("u1")]))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        drop(tx);

        let user = UserRepository::find_by_id(&store, &uid("u1"))
            .await
            .unwrap()
            .unwrap();
        assert!(!user.is_active);
    }

    #[tokio::test]
    async fn transaction_unusable_after_commit() {
        let store = seeded_store().await;
        let mut tx = store.begin().await.unwrap();
        tx.commit().await.unwrap();

        assert!(matches!(
            tx.user_exists(&uid("u1")).await,
            Err(StoreError::TransactionFinished)
        ));
        assert!(matches!(
            tx.commit().await,
            Err(StoreError::TransactionFinished)
        ));
    }

    #[tokio::test]
    async fn duplicate_reviewer_insert_is_invariant_violation() {
        let store = seeded_store().await;
        let pr = PullRequest::open(
            PullRequestId::new("pr-1").unwrap(),
            "Feature",
            uid("u1"),
            vec![uid("u2")],
        )
        .unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_pull_request(&pr).await.unwrap();

        let result = tx.set_reviewers(pr.id(), &[uid("u2")], &[]).await;
        assert!(matches!(result, Err(StoreError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn set_users_inactive_on_unknown_user_changes_nothing() {
        let store = seeded_store().await;
        let mut tx = store.begin().await.unwrap();

        let changed = tx
            .set_users_inactive(&BTreeSet::from([uid("ghost")]))
            .await
            .unwrap();
        assert_eq!(changed, 0);
    }

    #[tokio::test]
    async fn set_is_active_on_unknown_user_is_not_found() {
        let store = seeded_store().await;
        let result = store.set_is_active(&uid("ghost"), true).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
