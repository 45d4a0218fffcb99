mod checkpoint;
mod commands;
mod compiler;
mod config;
mod error;
mod fsutil;
mod runlog;
mod scratchpad;
mod store;
mod subprocess;
mod telemetry;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::agent::AgentCommand;
use commands::checkpoint::CheckpointArgs;
use commands::compile::CompileArgs;
use commands::cycle::CycleCommand;
use commands::init::InitArgs;
use commands::pad::PadCommand;
use commands::reset::ResetArgs;
use commands::run_log::LoopCommand;
use commands::status::StatusArgs;

#[derive(Debug, Parser)]
#[command(
    name = "pulse",
    version,
    about = "File-based status tracking for multi-agent dev loops"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Initialize a project: config, status document, scratchpads
    Init(InitArgs),
    /// Show orchestration status
    Status(StatusArgs),
    /// Update or inspect per-agent status records
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },
    /// Mark cycle boundaries and the current-agent pointer
    Cycle {
        #[command(subcommand)]
        command: CycleCommand,
    },
    /// Manage per-agent markdown scratchpads
    Pad {
        #[command(subcommand)]
        command: PadCommand,
    },
    /// Compile the status document into the dashboard JS asset
    Compile(CompileArgs),
    /// Commit working-tree changes as an agent checkpoint
    Checkpoint(CheckpointArgs),
    /// Track loop executions keyed by task name
    Loop {
        #[command(subcommand)]
        command: LoopCommand,
    },
    /// Reset all agents and the orchestrator to defaults
    Reset(ResetArgs),
    /// Print the JSON Schema for .pulse.toml
    Schema,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Status(_) => "status",
            Self::Agent { .. } => "agent",
            Self::Cycle { .. } => "cycle",
            Self::Pad { .. } => "pad",
            Self::Compile(_) => "compile",
            Self::Checkpoint(_) => "checkpoint",
            Self::Loop { .. } => "loop",
            Self::Reset(_) => "reset",
            Self::Schema => "schema",
        }
    }
}

fn main() -> ExitCode {
    telemetry::init();

    let cli = Cli::parse();

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Init(args) => args.execute(),
        Commands::Status(args) => args.execute(),
        Commands::Agent { command } => command.execute(),
        Commands::Cycle { command } => command.execute(),
        Commands::Pad { command } => command.execute(),
        Commands::Compile(args) => args.execute(),
        Commands::Checkpoint(args) => args.execute(),
        Commands::Loop { command } => command.execute(),
        Commands::Reset(args) => args.execute(),
        Commands::Schema => commands::schema::run_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(exit_err) = e.downcast_ref::<error::ExitError>() {
                eprintln!("error: {exit_err}");
                exit_err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
