use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::DomainError;

/// Unique identifier of a pull request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PullRequestId(String);

impl PullRequestId {
    /// Creates a new PullRequestId, rejecting blank input
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyIdentifier {
                field: "pull_request_id",
            });
        }
        Ok(PullRequestId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PullRequestId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PullRequestId::new(value)
    }
}

impl From<PullRequestId> for String {
    fn from(id: PullRequestId) -> Self {
        id.0
    }
}

impl fmt::Display for PullRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a pull request
///
/// # Status Transitions
/// ```text
/// Open -> Merged
/// ```
/// Merged is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrStatus {
    /// Accepting reviews; reviewer set may change
    Open,
    /// Merged; reviewer set is frozen
    Merged,
}

impl PrStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Example
    /// ```
    /// use reviewer_api::domain::pull_request::value_objects::PrStatus;
    ///
    /// assert!(PrStatus::Open.can_transition_to(PrStatus::Merged));
    /// assert!(!PrStatus::Merged.can_transition_to(PrStatus::Open));
    /// ```
    pub fn can_transition_to(&self, next: PrStatus) -> bool {
        matches!((self, next), (PrStatus::Open, PrStatus::Merged))
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, PrStatus::Merged)
    }

    /// Storage and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PrStatus::Open => "OPEN",
            PrStatus::Merged => "MERGED",
        }
    }
}

impl FromStr for PrStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(PrStatus::Open),
            "MERGED" => Ok(PrStatus::Merged),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
