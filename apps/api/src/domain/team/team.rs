use std::collections::BTreeSet;

use super::value_objects::TeamName;
use crate::domain::errors::DomainError;
use crate::domain::user::UserId;

/// A user's membership entry within a team
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub user_id: UserId,
    pub username: String,
    pub is_active: bool,
}

impl TeamMember {
    pub fn new(user_id: UserId, username: impl Into<String>, is_active: bool) -> Self {
        Self {
            user_id,
            username: username.into(),
            is_active,
        }
    }
}

/// Team aggregate root
///
/// A named group of users. Reviewers for a pull request are always drawn
/// from a single team.
///
/// # Invariants
/// - Name is a valid `TeamName`
/// - No user is listed twice
/// - Members are kept ordered by user id
///
/// # Example
/// ```
/// use reviewer_api::domain::team::{Team, TeamMember, TeamName};
/// use reviewer_api::domain::user::UserId;
///
/// let team = Team::new(
///     TeamName::new("backend").unwrap(),
///     vec![TeamMember::new(UserId::new("u1").unwrap(), "Alice", true)],
/// )
/// .expect("valid team");
///
/// assert_eq!(team.name().as_str(), "backend");
/// assert_eq!(team.members().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    name: TeamName,
    members: Vec<TeamMember>,
}

impl Team {
    /// Creates a new Team aggregate
    ///
    /// # Returns
    /// * `Ok(Team)` - Team with members sorted by user id
    /// * `Err(DomainError::DuplicateMember)` - If a user id repeats
    pub fn new(name: TeamName, mut members: Vec<TeamMember>) -> Result<Self, DomainError> {
        let mut seen = BTreeSet::new();
        for member in &members {
            if !seen.insert(member.user_id.clone()) {
                return Err(DomainError::DuplicateMember(member.user_id.to_string()));
            }
        }

        members.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        Ok(Self { name, members })
    }

    /// Returns the team's name
    pub fn name(&self) -> &TeamName {
        &self.name
    }

    /// Returns the members ordered by user id
    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// Skips duplicate checks since the store enforces unique user ids.
    pub fn from_persistence(name: TeamName, members: Vec<TeamMember>) -> Self {
        Self { name, members }
    }
}
