//! Scenario file format
//!
//! A YAML file holds either a single scenario or a `scenarios:` list.
//! Steps use the same fields as the built-in catalog:
//!
//! ```yaml
//! name: post-lifecycle
//! steps:
//!   - name: create post
//!     method: POST
//!     path: /posts
//!     body: { title: "Draft", body: "Text", userId: 1 }
//!     expect: { status: 201 }
//!     capture: [{ name: post_id, pointer: /id, non_empty: true }]
//!     state: created
//!   - name: fetch deleted post
//!     method: GET
//!     path: /posts/{{post_id}}
//!     fail_on_status: false
//!     expect: { status: 404 }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::common::{Error, Result};
use crate::scenario::Scenario;

/// Top-level shape of a scenario file
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ScenarioFile {
    /// A file listing several scenarios
    Many { scenarios: Vec<Scenario> },
    /// A file holding one scenario
    Single(Scenario),
}

impl ScenarioFile {
    pub fn into_scenarios(self) -> Vec<Scenario> {
        match self {
            ScenarioFile::Many { scenarios } => scenarios,
            ScenarioFile::Single(scenario) => vec![scenario],
        }
    }
}

/// Parse scenario YAML
pub fn parse_scenarios(content: &str, origin: &Path) -> Result<Vec<Scenario>> {
    let file: ScenarioFile = serde_yaml::from_str(content).map_err(|e| Error::ScenarioParse {
        path: origin.display().to_string(),
        message: e.to_string(),
    })?;

    let scenarios = file.into_scenarios();
    if scenarios.is_empty() {
        return Err(Error::ScenarioParse {
            path: origin.display().to_string(),
            message: "no scenarios defined".to_string(),
        });
    }
    Ok(scenarios)
}

/// Read and parse a scenario file
pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    parse_scenarios(&content, path)
}
