//! logtools CLI binary entrypoint.
//!
//! This is the main entry point for the `logtools` command-line tool.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use logtools_cli::cli::{Cli, Commands};
use logtools_cli::commands::{
    FilesCommand, KeywordCommand, NextSeqCommand, SweepCommand, WriteCommand,
};
use logtools_cli::output::OutputFormat;
use logtools_cli::open_tools;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    // Reads a file directly; no logger needed.
    if let Commands::NextSeq { path } = &cli.command {
        NextSeqCommand.execute(&mut stdout, &format, path)?;
        return Ok(());
    }

    let tools = open_tools(cli).context("failed to start logger")?;
    let result = match &cli.command {
        Commands::Write(args) => WriteCommand::new(&tools).execute(&mut stdout, &format, args),
        Commands::Keyword { command } => {
            KeywordCommand::new(&tools).execute(&mut stdout, &format, command)
        }
        Commands::Files => FilesCommand::new(&tools).execute(&mut stdout, &format),
        Commands::Sweep(args) => SweepCommand::new(&tools).execute(&mut stdout, &format, args),
        Commands::NextSeq { .. } => Ok(()),
    };
    tools.shutdown();
    result?;
    Ok(())
}
