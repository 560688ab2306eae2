//! Common utilities shared between the suite CLI and the mock server

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
