//! # covenant CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Covenant: schema validation and conditional-request preconditions.
#[derive(Parser, Debug)]
#[command(name = "covenant", version, about)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Validate a document against a JSON Schema.
    Validate(covenant_cli::validate::ValidateArgs),
    /// Evaluate conditional-request headers against a resource.
    Precondition(covenant_cli::precondition::PreconditionArgs),
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env();
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Validate(args) => match covenant_cli::validate::run(&args)? {
            None => {
                println!("{}", serde_json::json!({"valid": true}));
                Ok(ExitCode::SUCCESS)
            }
            Some(problem) => {
                println!("{}", serde_json::to_string_pretty(&problem)?);
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::Precondition(args) => {
            let report = covenant_cli::precondition::run(&args)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.status.is_none() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
