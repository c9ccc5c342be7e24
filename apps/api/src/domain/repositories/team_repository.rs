use async_trait::async_trait;

use super::errors::StoreResult;
use crate::domain::team::{Team, TeamName};

/// Repository trait for Team aggregate
///
/// Defines the contract for persisting and retrieving teams.
/// Implementations should handle database-specific details.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Create a team and upsert its members in one transaction
    ///
    /// A member that already exists moves to this team and takes the given
    /// username and active flag. Fails with `StoreError::Conflict` when the
    /// team name is taken.
    async fn create(&self, team: &Team) -> StoreResult<()>;

    /// Find a team by name, members ordered by user id
    async fn find_by_name(&self, name: &TeamName) -> StoreResult<Option<Team>>;
}
