use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use unasyncify::{RunMode, run};
use unasyncify_config::ProjectConfig;

/// Generate sync twins of async Python functions marked `@generate_unasynced`.
#[derive(Parser, Debug)]
#[command(name = "unasyncify", version)]
struct Cli {
    /// Project directory containing pyproject.toml
    #[arg(short, long)]
    project: PathBuf,

    /// Report files that would change instead of writing them
    #[arg(long)]
    check: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Returns whether the project is up to date afterwards.
fn execute(cli: &Cli) -> Result<bool> {
    let config = ProjectConfig::from_project_path(&cli.project)
        .with_context(|| format!("failed to load configuration for {}", cli.project.display()))?;
    let mode = if cli.check {
        RunMode::Check
    } else {
        RunMode::Write
    };

    println!("About to run transform...");
    let summary = run(&config, mode).context("transform aborted")?;

    if mode == RunMode::Check && !summary.changed.is_empty() {
        print!("{}", summary.diff);
        eprintln!("{} file(s) would be regenerated", summary.files_changed());
        return Ok(false);
    }
    println!("Done.");
    Ok(true)
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match execute(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}
