// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces against PostgreSQL

pub mod postgres_membership_store;
pub mod postgres_pull_request_repository;
pub mod postgres_team_repository;
pub mod postgres_user_repository;

pub use postgres_membership_store::PostgresMembershipStore;
pub use postgres_pull_request_repository::PostgresPullRequestRepository;
pub use postgres_team_repository::PostgresTeamRepository;
pub use postgres_user_repository::PostgresUserRepository;

use sqlx::PgPool;

use crate::domain::repositories::StoreResult;

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}

/// Postgres `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}
