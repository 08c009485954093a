//! pgschema - declarative schema migration for PostgreSQL
//!
//! `plan` computes the DDL needed to move a live schema to the state
//! declared in a file; `apply` executes a plan with drift detection.

use clap::{Parser, Subcommand};
use colored::Colorize;
use pgschema_cli::commands::apply::PlanSource;
use pgschema_cli::commands::{apply as apply_cmd, plan as plan_cmd};
use pgschema_cli::config::{PlanDatabaseArgs, TargetArgs, validate_lock_timeout};
use pgschema_cli::error::CliError;
use pgschema_cli::output::OutputSpec;
use pgschema_core::ApplyOptions;
use std::path::PathBuf;
use std::process::ExitCode;

/// Declarative schema migration for PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "pgschema")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the changes needed to reach the desired schema state
    Plan {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        plan_db: PlanDatabaseArgs,

        /// Desired-state DDL file
        #[arg(long, value_name = "PATH")]
        file: PathBuf,

        /// Human-readable output destination (`-` for stdout)
        #[arg(long, value_name = "PATH")]
        output_human: Option<PathBuf>,

        /// JSON plan output destination (`-` for stdout)
        #[arg(long, value_name = "PATH")]
        output_json: Option<PathBuf>,

        /// Raw SQL output destination (`-` for stdout)
        #[arg(long, value_name = "PATH")]
        output_sql: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Apply schema changes to the target database
    Apply {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        plan_db: PlanDatabaseArgs,

        /// Desired-state DDL file (runs plan first)
        #[arg(long, value_name = "PATH", conflicts_with = "plan")]
        file: Option<PathBuf>,

        /// Pre-computed JSON plan file
        #[arg(long, value_name = "PATH")]
        plan: Option<PathBuf>,

        /// Apply without asking for confirmation
        #[arg(long)]
        auto_approve: bool,

        /// lock_timeout for DDL statements, e.g. `30s`
        #[arg(long, value_name = "DURATION", value_parser = validate_lock_timeout)]
        lock_timeout: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Suppress plan display and progress output
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    // A missing .env is fine
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PGSCHEMA_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let runtime = tokio::runtime::Runtime::new().map_err(pgschema_core::Error::Io)?;
    match cli.command {
        Command::Plan {
            target,
            plan_db,
            file,
            output_human,
            output_json,
            output_sql,
            no_color,
        } => {
            if no_color {
                colored::control::set_override(false);
            }
            let outputs = OutputSpec {
                human: output_human,
                json: output_json,
                sql: output_sql,
            };
            runtime.block_on(plan_cmd::run(&target, &plan_db, &file, &outputs, !no_color))
        }
        Command::Apply {
            target,
            plan_db,
            file,
            plan,
            auto_approve,
            lock_timeout,
            no_color,
            quiet,
        } => {
            if no_color {
                colored::control::set_override(false);
            }
            let source = match (&file, &plan) {
                (Some(f), None) => PlanSource::DdlFile(f),
                (None, Some(p)) => PlanSource::PlanFile(p),
                _ => {
                    return Err(CliError::Usage(
                        "exactly one of --file or --plan is required".to_string(),
                    ));
                }
            };
            let options = ApplyOptions {
                auto_approve,
                lock_timeout,
                application_name: target.application_name.clone(),
                no_color,
                quiet,
            };
            runtime.block_on(apply_cmd::run(&target, &plan_db, source, options))
        }
    }
}
