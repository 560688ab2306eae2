//! posts-e2e - end-to-end scenarios for a posts/users REST API
//!
//! Runs register/create/update/delete chains against a configured base URL
//! and reports pass/fail per scenario.

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;
use posts_e2e::cli::{self, GlobalArgs};
use posts_e2e::commands;
use posts_e2e::common::logging;

#[derive(Parser)]
#[command(name = "posts-e2e", about = "End-to-end scenario suite for a posts/users REST API")]
#[command(version, long_about = None)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Target base URL (overrides config and POSTS_E2E_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.verbose);

    let global = GlobalArgs {
        config: cli.config,
        base_url: cli.base_url,
        verbose: cli.verbose,
    };

    if let Err(e) = cli::dispatch(cli.command, &global).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
