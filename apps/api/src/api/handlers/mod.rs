// HTTP handlers, one module per resource

pub mod health;
pub mod pull_requests;
pub mod statistics;
pub mod teams;
pub mod users;
