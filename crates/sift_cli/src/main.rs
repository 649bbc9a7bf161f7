//! tfsift CLI - Main entry point.
//!
//! Exit codes:
//! - 0: No issues found
//! - 1: General error
//! - 2: Invalid arguments or configuration
//! - 3: Issues found

use std::process::ExitCode;

use clap::Parser;
use sift_core::CoreError;
use sift_loader::LoadError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const ISSUES_FOUND: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Check(args) => commands::check::execute(args, cli.quiet).await,
        Commands::Rules(args) => commands::rules::execute(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(cli: &Cli) {
    let default = if cli.debug {
        "sift=debug,info"
    } else if cli.verbose {
        "sift=info,warn"
    } else if cli.quiet {
        "error"
    } else {
        "sift=warn,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Logging may already be initialized when embedded; keep going.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    let invalid = e.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<CoreError>(),
            Some(CoreError::Config(_)) | Some(CoreError::UnknownVariant { .. }) | Some(CoreError::Yaml(_))
        ) || matches!(
            cause.downcast_ref::<LoadError>(),
            Some(LoadError::NotADirectory(_)) | Some(LoadError::VarfileNotFound(_))
        )
    });

    if invalid {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
