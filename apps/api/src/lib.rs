//! Reviewer Service API Library
//!
//! This library provides the core functionality for the reviewer service:
//! domain model, the reviewer assignment engine, store adapters and the
//! HTTP layer.

pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod infrastructure;
