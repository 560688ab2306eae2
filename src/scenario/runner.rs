//! Scenario runner
//!
//! Executes a chain one step at a time. Step N+1 is rendered only after
//! step N's response has been received, checked and its captures stored;
//! the first failure ends the chain.

use std::time::Instant;

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::assert;
use super::template::{render_str, render_value, Variables};
use super::{Lifecycle, Scenario, Step};
use crate::common::{Error, Result};
use crate::fixture::RunFixture;
use crate::http::{ApiRequest, Transport};

/// Output settings for a run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Print each request line and response status
    pub verbose: bool,
    /// Print nothing (reports are consumed programmatically)
    pub quiet: bool,
}

/// How a scenario ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    /// The target environment lacks data the scenario depends on
    PreconditionUnmet,
}

/// Result of one scenario
#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub outcome: Outcome,
    pub steps_run: usize,
    pub steps_total: usize,
    /// Last lifecycle state reached, `Failed` once a tracked chain breaks
    pub state: Option<Lifecycle>,
    pub failed_step: Option<String>,
    pub error: Option<String>,
    /// The failing step never got a checkable response
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub transport_error: bool,
    pub duration_ms: u128,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Results of a whole run, in execution order
#[derive(Debug, Serialize, Default)]
pub struct SuiteReport {
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn total(&self) -> usize {
        self.scenarios.len()
    }

    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Print the per-scenario pass/fail table
    pub fn print_summary(&self) {
        println!("\n{}", "Summary:".cyan().bold());
        for report in &self.scenarios {
            let mark = match report.outcome {
                Outcome::Passed => "✓".green(),
                Outcome::Failed => "✗".red(),
                Outcome::PreconditionUnmet => "!".yellow(),
            };
            let detail = match report.outcome {
                Outcome::Passed => String::new(),
                Outcome::Failed if report.transport_error => format!(
                    " (transport error at step {}/{})",
                    report.steps_run, report.steps_total
                ),
                Outcome::Failed => format!(
                    " (step {}/{})",
                    report.steps_run, report.steps_total
                ),
                Outcome::PreconditionUnmet => " (precondition unmet)".to_string(),
            };
            println!("  {} {}{}", mark, report.name, detail.dimmed());
        }

        let line = format!(
            "{} passed, {} failed, {} total",
            self.passed(),
            self.failed(),
            self.total()
        );
        if self.all_passed() {
            println!("\n{}\n", line.green().bold());
        } else {
            println!("\n{}\n", line.red().bold());
        }
    }
}

/// Run every scenario in order
///
/// All scenarios are validated before the first request goes out.
pub async fn run_suite(
    transport: &dyn Transport,
    fixture: &RunFixture,
    scenarios: &[Scenario],
    options: &RunOptions,
) -> Result<SuiteReport> {
    for scenario in scenarios {
        scenario.validate()?;
    }

    let mut report = SuiteReport::default();
    for scenario in scenarios {
        report
            .scenarios
            .push(run_scenario(transport, fixture, scenario, options).await?);
    }
    Ok(report)
}

/// Run one scenario chain
///
/// Returns `Err` only when the scenario is malformed; step failures are
/// recorded in the report.
pub async fn run_scenario(
    transport: &dyn Transport,
    fixture: &RunFixture,
    scenario: &Scenario,
    options: &RunOptions,
) -> Result<ScenarioReport> {
    scenario.validate()?;

    let started = Instant::now();
    let steps_total = scenario.steps.len();
    let tracks_lifecycle = scenario.steps.iter().any(|s| s.state.is_some());
    let mut vars = Variables::from_fixture(fixture);
    let mut state: Option<Lifecycle> = None;

    if !options.quiet {
        println!(
            "\n{} {}",
            "Running Scenario:".blue().bold(),
            scenario.name.white().bold()
        );
        if let Some(desc) = &scenario.description {
            println!("  {}", desc.dimmed());
        }
    }

    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;

        match execute_step(transport, step, &mut vars, options).await {
            Ok(()) => {
                if let Some(next) = step.state {
                    state = Some(next);
                }
                info!(scenario = %scenario.name, step = %step.name, "step passed");
                if !options.quiet {
                    let suffix = step
                        .state
                        .map(|s| format!(" [{}]", s))
                        .unwrap_or_default();
                    println!(
                        "  {} Step {}: {}{}",
                        "✓".green(),
                        step_num,
                        step.name.dimmed(),
                        suffix.dimmed()
                    );
                }
            }
            Err(e) => {
                let (outcome, error) = match e {
                    Error::Assertion(msg) if step.precondition => {
                        (Outcome::PreconditionUnmet, Error::Precondition(msg))
                    }
                    other => (Outcome::Failed, other),
                };
                let transport_error = error.is_transport();

                if transport_error {
                    warn!(scenario = %scenario.name, step = %step.name, error = %error, "request failed");
                } else {
                    warn!(scenario = %scenario.name, step = %step.name, error = %error, "step failed");
                }
                if !options.quiet {
                    println!("  {} Step {}: {}: {}", "✗".red(), step_num, step.name, error);
                }

                return Ok(ScenarioReport {
                    name: scenario.name.clone(),
                    outcome,
                    steps_run: step_num,
                    steps_total,
                    state: tracks_lifecycle.then_some(Lifecycle::Failed),
                    failed_step: Some(step.name.clone()),
                    error: Some(error.to_string()),
                    transport_error,
                    duration_ms: started.elapsed().as_millis(),
                });
            }
        }
    }

    if !options.quiet {
        println!("  {} {}", "✓".green().bold(), "Scenario Passed".green().bold());
    }

    Ok(ScenarioReport {
        name: scenario.name.clone(),
        outcome: Outcome::Passed,
        steps_run: steps_total,
        steps_total,
        state,
        failed_step: None,
        error: None,
        transport_error: false,
        duration_ms: started.elapsed().as_millis(),
    })
}

/// Render, send, check and capture one step
async fn execute_step(
    transport: &dyn Transport,
    step: &Step,
    vars: &mut Variables,
    options: &RunOptions,
) -> Result<()> {
    let request = render_request(step, vars)?;

    if options.verbose && !options.quiet {
        println!("      {} {}", request.method.as_str().dimmed(), request.path.dimmed());
    }

    let response = transport.execute(&request).await?;

    if options.verbose && !options.quiet {
        println!("      -> {}", response.status.to_string().dimmed());
    }

    assert::check(&step.expect, &response, vars)?;

    for capture in &step.capture {
        let value = response.body.pointer(&capture.pointer).cloned().ok_or_else(|| {
            Error::Assertion(format!(
                "cannot capture '{}': field '{}' missing from body {}",
                capture.name,
                capture.pointer,
                assert::preview(&response.body)
            ))
        })?;

        if capture.non_empty && !is_usable(&value) {
            return Err(Error::Assertion(format!(
                "cannot capture '{}': field '{}' is empty ({})",
                capture.name, capture.pointer, value
            )));
        }

        vars.insert(capture.name.clone(), value);
    }

    Ok(())
}

/// Build the concrete request for `step` from the current variables
fn render_request(step: &Step, vars: &Variables) -> Result<ApiRequest> {
    let mut request = ApiRequest::new(step.method, render_str(&step.path, vars)?)
        .with_status_policy(step.status_policy());

    for (name, value) in &step.headers {
        request = request.with_header(name.clone(), render_str(value, vars)?);
    }
    if let Some(body) = &step.body {
        request = request.with_json(render_value(body, vars)?);
    }
    Ok(request)
}

fn is_usable(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty(),
        Value::Number(_) => true,
        _ => false,
    }
}
