//! Runs scenario files through the chain runner

use std::path::Path;

use colored::Colorize;
use tracing::info;

use super::config::load_scenarios;
use crate::common::Result;
use crate::fixture::RunFixture;
use crate::http::Transport;
use crate::scenario::{run_suite, RunOptions, SuiteReport};

/// Run every scenario in each file, in file order
///
/// All files are loaded and validated before the first request goes out.
pub async fn run_files(
    transport: &dyn Transport,
    fixture: &RunFixture,
    paths: &[impl AsRef<Path>],
    options: &RunOptions,
) -> Result<SuiteReport> {
    let mut scenarios = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let loaded = load_scenarios(path)?;
        info!(file = %path.display(), count = loaded.len(), "loaded scenario file");
        if !options.quiet {
            println!(
                "{} {}",
                "Loaded:".cyan(),
                path.display().to_string().dimmed()
            );
        }
        scenarios.extend(loaded);
    }

    run_suite(transport, fixture, &scenarios, options).await
}
