//! Scenario model
//!
//! A scenario is an ordered chain of HTTP steps. Each step renders its
//! request from the variables captured so far, checks the response against
//! its expectation, and captures values for the steps after it. The same
//! types back the built-in catalog and YAML scenario files.

pub mod assert;
mod runner;
pub mod template;

pub use runner::{run_scenario, run_suite, Outcome, RunOptions, ScenarioReport, SuiteReport};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{Error, Result};
use crate::http::{HttpMethod, StatusPolicy};

/// A complete scenario
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    #[serde(default)]
    pub description: Option<String>,
    /// The chain of steps, executed in order
    pub steps: Vec<Step>,
}

/// One request/response exchange in a chain
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Step {
    pub name: String,
    pub method: HttpMethod,
    /// Path template, e.g. `/posts/{{post_id}}`
    pub path: String,
    /// Header templates
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON body template
    #[serde(default)]
    pub body: Option<Value>,
    /// When false, non-2xx responses reach the expectation instead of
    /// failing the step in the transport
    #[serde(default = "default_fail_on_status")]
    pub fail_on_status: bool,
    #[serde(default)]
    pub expect: Expectation,
    #[serde(default)]
    pub capture: Vec<Capture>,
    /// Lifecycle state the entity is in once this step passes
    #[serde(default)]
    pub state: Option<Lifecycle>,
    /// Checks the environment rather than the API's behavior
    #[serde(default)]
    pub precondition: bool,
}

fn default_fail_on_status() -> bool {
    true
}

/// Checks applied to a step's response
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    /// Exact status code
    pub status: Option<u16>,
    /// Token the content-type header must contain
    pub content_type: Option<String>,
    /// JSON pointer -> expected value (values may be templates)
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    /// JSON pointer -> expected substring
    #[serde(default)]
    pub fields_contain: BTreeMap<String, String>,
    /// JSON pointers that must hold a non-empty string
    #[serde(default)]
    pub non_empty: Vec<String>,
    /// Body is an array with at least this many elements
    pub min_len: Option<usize>,
    /// Body is an array whose first N elements number exactly N
    pub first_n: Option<usize>,
    /// Body is an array holding an element with each of these ids
    #[serde(default)]
    pub contains_ids: Vec<i64>,
}

/// A value taken from a response for later steps
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Capture {
    /// Variable name later steps refer to as `{{name}}`
    pub name: String,
    /// JSON pointer into the response body
    pub pointer: String,
    /// Fail the step unless the value is a non-empty string or a number
    #[serde(default)]
    pub non_empty: bool,
}

/// States of an entity moving through a create/update/delete chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Created,
    Updated,
    Deleted,
    ConfirmedAbsent,
    /// Absorbing state entered when any step fails
    Failed,
}

impl Lifecycle {
    /// Whether a chain may move from `from` (None = nothing created yet) to `to`
    pub fn can_follow(from: Option<Lifecycle>, to: Lifecycle) -> bool {
        use Lifecycle::*;
        match (from, to) {
            (_, Failed) => true,
            (None, Created) => true,
            (Some(Created), Updated | Deleted) => true,
            (Some(Updated), Updated | Deleted) => true,
            (Some(Deleted), ConfirmedAbsent) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Created => "created",
            Lifecycle::Updated => "updated",
            Lifecycle::Deleted => "deleted",
            Lifecycle::ConfirmedAbsent => "confirmed absent",
            Lifecycle::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl Scenario {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let description: String = description.into();
        Self {
            name: name.into(),
            description: (!description.is_empty()).then_some(description),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Check the chain is well formed before anything is sent
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(Error::Config(format!("Scenario '{}' has no steps", self.name)));
        }

        let mut state = None;
        for (i, step) in self.steps.iter().enumerate() {
            let step_num = i + 1;

            if let Some(expected) = step.expect.status {
                if expected >= 400 && step.fail_on_status {
                    return Err(Error::Config(format!(
                        "Scenario '{}' step {} expects status {} but fails on non-2xx status; set fail_on_status: false",
                        self.name, step_num, expected
                    )));
                }
            }

            if let Some(next) = step.state {
                if next == Lifecycle::Failed || !Lifecycle::can_follow(state, next) {
                    return Err(Error::Config(format!(
                        "Scenario '{}' step {}: cannot move from {} to {}",
                        self.name,
                        step_num,
                        state.map(|s| s.to_string()).unwrap_or_else(|| "start".to_string()),
                        next
                    )));
                }
                state = Some(next);
            }

            for pointer in step
                .capture
                .iter()
                .map(|c| &c.pointer)
                .chain(step.expect.fields.keys())
                .chain(step.expect.fields_contain.keys())
                .chain(step.expect.non_empty.iter())
            {
                if !pointer.is_empty() && !pointer.starts_with('/') {
                    return Err(Error::Config(format!(
                        "Scenario '{}' step {}: '{}' is not a JSON pointer (must start with '/')",
                        self.name, step_num, pointer
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Step {
    fn new(name: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
            fail_on_status: true,
            expect: Expectation::default(),
            capture: Vec::new(),
            state: None,
            precondition: false,
        }
    }

    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, HttpMethod::Get, path)
    }

    pub fn post(name: impl Into<String>, path: impl Into<String>, body: Value) -> Self {
        Self::new(name, HttpMethod::Post, path).body(body)
    }

    pub fn put(name: impl Into<String>, path: impl Into<String>, body: Value) -> Self {
        Self::new(name, HttpMethod::Put, path).body(body)
    }

    pub fn delete(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, HttpMethod::Delete, path)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Let non-2xx responses through to the expectation
    pub fn surface_status(mut self) -> Self {
        self.fail_on_status = false;
        self
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expect.status = Some(status);
        self
    }

    pub fn expect_content_type(mut self, token: impl Into<String>) -> Self {
        self.expect.content_type = Some(token.into());
        self
    }

    pub fn expect_field(mut self, pointer: impl Into<String>, value: Value) -> Self {
        self.expect.fields.insert(pointer.into(), value);
        self
    }

    pub fn expect_field_contains(mut self, pointer: impl Into<String>, needle: impl Into<String>) -> Self {
        self.expect.fields_contain.insert(pointer.into(), needle.into());
        self
    }

    pub fn expect_non_empty(mut self, pointer: impl Into<String>) -> Self {
        self.expect.non_empty.push(pointer.into());
        self
    }

    pub fn expect_min_len(mut self, len: usize) -> Self {
        self.expect.min_len = Some(len);
        self
    }

    pub fn expect_first_n(mut self, n: usize) -> Self {
        self.expect.first_n = Some(n);
        self
    }

    pub fn expect_ids(mut self, ids: &[i64]) -> Self {
        self.expect.contains_ids.extend_from_slice(ids);
        self
    }

    pub fn capture(mut self, name: impl Into<String>, pointer: impl Into<String>) -> Self {
        self.capture.push(Capture {
            name: name.into(),
            pointer: pointer.into(),
            non_empty: false,
        });
        self
    }

    /// Capture a value the chain cannot continue without
    pub fn capture_required(mut self, name: impl Into<String>, pointer: impl Into<String>) -> Self {
        self.capture.push(Capture {
            name: name.into(),
            pointer: pointer.into(),
            non_empty: true,
        });
        self
    }

    pub fn establishes(mut self, state: Lifecycle) -> Self {
        self.state = Some(state);
        self
    }

    pub fn as_precondition(mut self) -> Self {
        self.precondition = true;
        self
    }

    pub(crate) fn status_policy(&self) -> StatusPolicy {
        if self.fail_on_status {
            StatusPolicy::FailOnStatus
        } else {
            StatusPolicy::Surface
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lifecycle_transitions() {
        use Lifecycle::*;
        assert!(Lifecycle::can_follow(None, Created));
        assert!(Lifecycle::can_follow(Some(Created), Updated));
        assert!(Lifecycle::can_follow(Some(Updated), Deleted));
        assert!(Lifecycle::can_follow(Some(Deleted), ConfirmedAbsent));
        assert!(Lifecycle::can_follow(Some(Updated), Failed));

        assert!(!Lifecycle::can_follow(None, Updated));
        assert!(!Lifecycle::can_follow(Some(Deleted), Updated));
        assert!(!Lifecycle::can_follow(Some(Failed), Created));
        assert!(!Lifecycle::can_follow(Some(ConfirmedAbsent), Deleted));
    }

    #[test]
    fn test_validate_rejects_rejection_without_surface() {
        let scenario = Scenario::new("missing", "").step(
            Step::put("update", "/posts/100000", json!({})).expect_status(404),
        );
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("fail_on_status"));

        let scenario = Scenario::new("missing", "").step(
            Step::put("update", "/posts/100000", json!({}))
                .surface_status()
                .expect_status(404),
        );
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_order_states() {
        let scenario = Scenario::new("bad", "")
            .step(Step::delete("delete", "/posts/1").establishes(Lifecycle::Deleted));
        assert!(matches!(scenario.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_relative_pointer() {
        let scenario = Scenario::new("bad", "")
            .step(Step::post("create", "/posts", json!({})).capture("post_id", "id"));
        assert!(scenario.validate().unwrap_err().to_string().contains("JSON pointer"));
    }

    #[test]
    fn test_validate_rejects_empty_scenario() {
        assert!(Scenario::new("empty", "").validate().is_err());
    }

    #[test]
    fn test_step_yaml_defaults() {
        let step: Step = serde_yaml::from_str(
            r#"
name: list
method: GET
path: /posts
expect:
  status: 200
"#,
        )
        .unwrap();
        assert!(step.fail_on_status);
        assert_eq!(step.status_policy(), StatusPolicy::FailOnStatus);
        assert!(step.capture.is_empty());
        assert_eq!(step.expect.status, Some(200));
        assert!(!step.precondition);
    }

    #[test]
    fn test_step_yaml_rejects_unknown_keys() {
        let parsed: std::result::Result<Step, _> = serde_yaml::from_str(
            r#"
name: list
method: GET
path: /posts
expects:
  status: 200
"#,
        );
        assert!(parsed.is_err());
    }
}
