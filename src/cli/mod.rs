//! CLI command handling
//!
//! Resolves configuration, builds the transport and run fixture, and
//! formats suite results.

use std::path::PathBuf;

use colored::Colorize;

use crate::catalog;
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::paths;
use crate::common::{Error, Result};
use crate::fixture::{FixtureProvider, RunFixture};
use crate::http::ApiClient;
use crate::scenario::{run_suite, RunOptions, SuiteReport};
use crate::testing;

/// Flags shared by every command
#[derive(Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Explicit config file instead of the default location
    pub config: Option<PathBuf>,
    /// Base URL overriding config and environment
    pub base_url: Option<String>,
    /// Print request lines and response statuses
    pub verbose: bool,
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, global: &GlobalArgs) -> Result<()> {
    match command {
        Commands::List => {
            println!("Built-in scenarios:");
            for (i, scenario) in catalog::builtin().iter().enumerate() {
                println!(
                    "  {:>2}. {} {}",
                    i + 1,
                    scenario.name,
                    scenario.description.as_deref().unwrap_or("").dimmed()
                );
            }
            Ok(())
        }

        Commands::Config => {
            let config = Config::resolve(global.config.as_deref(), global.base_url.clone())?;
            let source = global
                .config
                .clone()
                .or_else(paths::config_path)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string());
            println!("# config file: {}", source);
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
            print!("{}", rendered);
            Ok(())
        }

        Commands::Run { only, json } => {
            let config = Config::resolve(global.config.as_deref(), global.base_url.clone())?;
            let scenarios = catalog::select(catalog::builtin(), &only)?;
            let (client, fixture) = prepare(&config)?;
            let options = run_options(global, json);

            if !json {
                println!("{} {}", "Target:".cyan(), client.base_url());
            }

            let report = run_suite(&client, &fixture, &scenarios, &options).await?;
            finish(report, json)
        }

        Commands::Test { paths, json } => {
            let config = Config::resolve(global.config.as_deref(), global.base_url.clone())?;
            let (client, fixture) = prepare(&config)?;
            let options = run_options(global, json);

            if !json {
                println!("{} {}", "Target:".cyan(), client.base_url());
            }

            let report = testing::run_files(&client, &fixture, &paths, &options).await?;
            finish(report, json)
        }
    }
}

fn run_options(global: &GlobalArgs, json: bool) -> RunOptions {
    RunOptions {
        verbose: global.verbose,
        quiet: json,
    }
}

/// Build the transport and the run's one-time fixture
fn prepare(config: &Config) -> Result<(ApiClient, RunFixture)> {
    let client = ApiClient::from_config(config)?;
    let mut provider = FixtureProvider::new(config.fixture.email_domain.clone());
    let fixture = RunFixture::generate(&mut provider, &config.password_constraints())?;
    Ok((client, fixture))
}

/// Print the report and turn failures into the process exit status
fn finish(report: SuiteReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_summary();
    }

    if report.all_passed() {
        Ok(())
    } else {
        Err(Error::SuiteFailed {
            failed: report.failed(),
            total: report.total(),
        })
    }
}
