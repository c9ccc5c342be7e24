use thiserror::Error;

/// Violations of domain rules raised by value objects and aggregates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// An identifier or name was empty after trimming
    #[error("{field} cannot be empty")]
    EmptyIdentifier { field: &'static str },

    /// A status value read from outside the domain is unknown
    #[error("Unknown pull request status: {0}")]
    UnknownStatus(String),

    /// The author appears in the reviewer set
    #[error("Author {0} cannot review their own pull request")]
    AuthorAsReviewer(String),

    /// The same reviewer would be assigned twice
    #[error("Reviewer {0} is already assigned")]
    DuplicateReviewer(String),

    /// Too many reviewers requested at creation
    #[error("At most {max} reviewers can be assigned at creation, got {got}")]
    TooManyReviewers { max: usize, got: usize },

    /// The reviewer set of a merged pull request was touched
    #[error("Pull request {0} is merged and its reviewers are frozen")]
    Frozen(String),

    /// A team lists the same user twice
    #[error("User {0} is listed more than once in the team")]
    DuplicateMember(String),
}
