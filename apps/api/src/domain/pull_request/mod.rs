// Pull request domain module
// Contains the pull request aggregate root and its value objects

#![allow(clippy::module_inception)]

pub mod pull_request;
pub mod value_objects;

pub use pull_request::{PullRequest, PullRequestShort, MAX_REVIEWERS};
pub use value_objects::{PrStatus, PullRequestId};
