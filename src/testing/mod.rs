//! YAML scenario files
//!
//! Lets scenarios beyond the built-in catalog be described as data and run
//! through the same chain runner, with the same run fixture variables.

mod config;
mod runner;

pub use config::{load_scenarios, parse_scenarios, ScenarioFile};
pub use runner::run_files;
