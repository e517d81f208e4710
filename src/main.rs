//! Binary entry point for the research orchestration core's demo CLI.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use research_core::cli::{Cli, execute};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match execute(&cli).await {
        Ok(output) => {
            if !output.is_empty()
                && let Err(e) = writeln!(io::stdout(), "{output}")
                && e.kind() != io::ErrorKind::BrokenPipe
            {
                eprintln!("error writing to stdout: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
