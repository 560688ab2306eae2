//! posts-e2e - end-to-end scenario suite for a posts/users REST API
//!
//! This library provides the fixture generator, the HTTP transport, the
//! chained scenario runner and the built-in scenario catalog, plus an
//! in-memory reference API for running the suite offline.

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod common;
pub mod fixture;
pub mod http;
pub mod mock;
pub mod scenario;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use fixture::RunFixture;
pub use scenario::{Scenario, Step};
