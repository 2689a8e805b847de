// salesflow/src/main.rs

use clap::Parser;
use miette::Diagnostic;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use salesflow_core::SalesflowError;

mod cli;
mod commands;

use cli::{Cli, Commands};

/// Ran to completion but every record was rejected.
const EXIT_EMPTY_RESULT: u8 = 2;

fn init_tracing(verbose: bool) {
    // RUST_LOG=debug salesflow run ... to see every rejection
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Seed {
            project_dir,
            count,
            seed,
        } => commands::seed::execute(project_dir, count, seed).await,
        Commands::Extract { project_dir } => commands::extract::execute(project_dir).await,
        Commands::Transform {
            project_dir,
            input,
            output,
        } => commands::transform::execute(project_dir, input, output),
        Commands::Load {
            project_dir,
            input,
            mode,
        } => commands::load::execute(project_dir, input, mode).await,
        Commands::Report { project_dir } => commands::report::execute(project_dir).await,
        Commands::Run { project_dir } => commands::run::execute(project_dir).await,
        Commands::Inspect {
            project_dir,
            table,
            limit,
        } => commands::inspect::execute(project_dir, table, limit).await,
    }
}

/// The library error buried in an anyhow chain, if any.
fn salesflow_error(err: &anyhow::Error) -> Option<&SalesflowError> {
    err.chain().find_map(|cause| cause.downcast_ref::<SalesflowError>())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Err(err) = dispatch(cli.command).await else {
        return ExitCode::SUCCESS;
    };

    let diagnostic = salesflow_error(&err);
    if diagnostic.is_some_and(SalesflowError::is_empty_result) {
        eprintln!("\n⚠️  EMPTY RESULT: {:#}", err);
        return ExitCode::from(EXIT_EMPTY_RESULT);
    }

    eprintln!("\n💥 ERROR: {:#}", err);
    if let Some(help) = diagnostic.and_then(|d| d.help()) {
        eprintln!("   👉 {}", help);
    }
    ExitCode::FAILURE
}
