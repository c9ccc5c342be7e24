// Reviewer engine
// Selection and assignment policies plus the service that runs them in store transactions

pub mod assignment;
pub mod cascade;
pub mod reassignment;
pub mod selector;
pub mod service;

pub use cascade::CascadeReport;
pub use reassignment::ReassignOutcome;
pub use service::{CreateOutcome, ReviewerService};
