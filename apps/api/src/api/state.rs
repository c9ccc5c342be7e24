use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::repositories::{
    MembershipStore, PullRequestRepository, TeamRepository, UserRepository,
};
use crate::engine::ReviewerService;
use crate::infrastructure::memory::InMemoryStore;
use crate::infrastructure::repositories::{
    PostgresMembershipStore, PostgresPullRequestRepository, PostgresTeamRepository,
    PostgresUserRepository,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub reviewers: Arc<ReviewerService>,
    pub teams: Arc<dyn TeamRepository>,
    pub users: Arc<dyn UserRepository>,
    pub pull_requests: Arc<dyn PullRequestRepository>,
}

impl AppState {
    /// Wire every port to PostgreSQL
    pub fn postgres(pool: PgPool, seed: Option<u64>) -> Self {
        let store = Arc::new(PostgresMembershipStore::new(pool.clone()));

        Self {
            reviewers: Arc::new(reviewer_service(store, seed)),
            teams: Arc::new(PostgresTeamRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            pull_requests: Arc::new(PostgresPullRequestRepository::new(pool)),
        }
    }

    /// Wire every port to one in-memory store
    pub fn in_memory(store: InMemoryStore, seed: Option<u64>) -> Self {
        Self {
            reviewers: Arc::new(reviewer_service(Arc::new(store.clone()), seed)),
            teams: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            pull_requests: Arc::new(store),
        }
    }
}

fn reviewer_service(store: Arc<dyn MembershipStore>, seed: Option<u64>) -> ReviewerService {
    match seed {
        Some(seed) => ReviewerService::with_seed(store, seed),
        None => ReviewerService::new(store),
    }
}
