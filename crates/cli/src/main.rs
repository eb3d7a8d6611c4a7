//! intellisense-check CLI
//!
//! Runs the workspace IntelliSense validator against fixture workspaces.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use intellisense_check::{check_fixture, run_fixture, RunSummary};
use intellisense_check_core::config::Config;
use intellisense_check_core::fixture::Fixture;
use intellisense_check_core::report::{RecordingPresenter, StdoutPresenter};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "intellisense-check")]
#[command(about = "Report project contexts whose IntelliSense info has no command lines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the summary as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch every fixture workspace through a full indexing run
    Run {
        /// Fixture describing workspaces, projects and files
        #[arg(long, value_name = "FILE")]
        fixture: PathBuf,
    },
    /// Validate fixture workspaces once, without watching indexing
    Check {
        /// Fixture describing workspaces, projects and files
        #[arg(long, value_name = "FILE")]
        fixture: PathBuf,

        /// Only check the workspace with this name
        #[arg(long)]
        workspace: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose)?;

    match cli.command {
        Some(Commands::Run { fixture }) => run(&fixture, cli.config.as_deref(), cli.json).await,
        Some(Commands::Check { fixture, workspace }) => {
            check(&fixture, workspace.as_deref(), cli.config.as_deref(), cli.json).await
        }
        None => {
            println!("Run 'intellisense-check run --fixture <FILE>', or --help for more options");
            Ok(())
        }
    }
}

/// Initialize logging system
///
/// Logs go to stderr so `--json` output stays parseable.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "intellisense_check={level},intellisense_check_core={level},intellisense_check_watcher={level}"
        ))
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn load_inputs(fixture: &Path, config: Option<&Path>) -> Result<(Fixture, Config)> {
    let config = Config::load(config).context("Failed to load configuration")?;
    debug!("Using configuration: {:?}", config);
    let fixture = Fixture::from_file(fixture)
        .with_context(|| format!("Failed to read fixture {}", fixture.display()))?;
    Ok((fixture, config))
}

async fn run(fixture: &Path, config: Option<&Path>, json: bool) -> Result<()> {
    let (fixture, config) = load_inputs(fixture, config)?;

    if json {
        let (mut summary, presenter) =
            run_fixture(&fixture, &config, RecordingPresenter::new()).await?;
        summary.notices = presenter.notices();
        print_json(&summary)
    } else {
        let (summary, _) = run_fixture(&fixture, &config, StdoutPresenter).await?;
        print_summary(&summary);
        Ok(())
    }
}

async fn check(
    fixture: &Path,
    workspace: Option<&str>,
    config: Option<&Path>,
    json: bool,
) -> Result<()> {
    let (fixture, config) = load_inputs(fixture, config)?;

    if json {
        let (mut summary, presenter) =
            check_fixture(&fixture, &config, workspace, RecordingPresenter::new()).await?;
        summary.notices = presenter.notices();
        print_json(&summary)
    } else {
        let (summary, _) = check_fixture(&fixture, &config, workspace, StdoutPresenter).await?;
        print_summary(&summary);
        Ok(())
    }
}

fn print_json(summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
    println!("{json}");
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    for ws in &summary.workspaces {
        let projects: usize = ws.outcomes.iter().map(|o| o.project_contexts).sum();
        println!(
            "{} ({}): {} pass(es), {} project context(s), {} without command lines",
            ws.name,
            ws.location.display(),
            ws.outcomes.len(),
            projects,
            ws.violation_count()
        );
    }
    println!(
        "Total: {} pass(es), {} violation(s)",
        summary.pass_count(),
        summary.violation_count()
    );
}
