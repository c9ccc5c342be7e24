// Infrastructure layer module
// Contains store adapters for the domain ports
// Follows Hexagonal Architecture

pub mod memory;
pub mod repositories;
