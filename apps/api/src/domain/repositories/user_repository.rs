use async_trait::async_trait;

use super::errors::StoreResult;
use crate::domain::team::TeamName;
use crate::domain::user::UserId;

/// User data for persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub team_name: Option<TeamName>,
    pub is_active: bool,
}

/// Repository trait for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Flip a single user's active flag and return the updated record
    ///
    /// Does not touch review assignments. Fails with `StoreError::NotFound`
    /// when the user does not exist.
    async fn set_is_active(&self, id: &UserId, is_active: bool) -> StoreResult<User>;
}
