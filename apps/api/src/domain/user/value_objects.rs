use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::DomainError;

/// UserId value object identifying a team member
///
/// # Invariants
/// - Must not be empty or whitespace only
/// - Surrounding whitespace is stripped
/// - Is immutable after construction
///
/// Ordering is lexicographic, which gives candidate lists a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId value object
    ///
    /// # Example
    /// ```
    /// use reviewer_api::domain::user::value_objects::UserId;
    ///
    /// let id = UserId::new(" u1 ").expect("valid id");
    /// assert_eq!(id.as_str(), "u1");
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyIdentifier { field: "user_id" });
        }
        Ok(UserId(trimmed.to_string()))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserId::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
