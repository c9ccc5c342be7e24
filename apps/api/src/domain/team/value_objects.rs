use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::DomainError;

/// Unique name identifying a team
///
/// # Invariants
/// - Must not be empty or whitespace only
/// - Surrounding whitespace is stripped
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamName(String);

impl TeamName {
    /// Creates a new TeamName value object
    ///
    /// # Example
    /// ```
    /// use reviewer_api::domain::team::value_objects::TeamName;
    ///
    /// assert_eq!(TeamName::new("backend").unwrap().as_str(), "backend");
    /// assert!(TeamName::new("  ").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyIdentifier { field: "team_name" });
        }
        Ok(TeamName(trimmed.to_string()))
    }

    /// Returns the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TeamName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TeamName::new(value)
    }
}

impl From<TeamName> for String {
    fn from(name: TeamName) -> Self {
        name.0
    }
}

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_team_name() {
        assert_eq!(TeamName::new("payments").unwrap().as_str(), "payments");
    }

    #[test]
    fn team_name_is_trimmed() {
        assert_eq!(TeamName::new(" payments ").unwrap().as_str(), "payments");
    }

    #[test]
    fn empty_team_name_fails() {
        assert_eq!(
            TeamName::new(""),
            Err(DomainError::EmptyIdentifier { field: "team_name" })
        );
    }

    #[test]
    fn team_name_serializes_as_plain_string() {
        let name = TeamName::new("core").unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"core\"");
    }
}
