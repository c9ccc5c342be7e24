// Repository interfaces (ports)
// Infrastructure provides the adapters

pub mod errors;
pub mod membership_store;
pub mod pull_request_repository;
pub mod team_repository;
pub mod user_repository;

pub use errors::{StoreError, StoreResult};
pub use membership_store::{MembershipStore, PrSnapshot, StoreTx};
pub use pull_request_repository::{PullRequestRepository, ReviewStatistics};
pub use team_repository::TeamRepository;
pub use user_repository::{User, UserRepository};
