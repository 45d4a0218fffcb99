use std::path::PathBuf;

use clap::Subcommand;

use super::Workspace;
use crate::error::ExitError;
use crate::runlog::IterationNote;

#[derive(Debug, Subcommand)]
pub enum LoopCommand {
    /// Register a new loop under a task name
    Init {
        /// Task name key
        task_name: String,
        /// Task description
        #[arg(long)]
        task: String,
        /// Completion promise searched for by the outer loop
        #[arg(long)]
        promise: String,
        /// Iteration budget
        #[arg(long, default_value = "25")]
        max_iterations: u32,
        /// Project root directory
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Record one iteration's notes
    Update {
        task_name: String,
        #[arg(long)]
        iteration: u32,
        /// Comma-separated list of completed items
        #[arg(long, value_delimiter = ',')]
        completed: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        attempted: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        remaining: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        verification: Vec<String>,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Record a command execution
    LogCommand {
        task_name: String,
        /// The command line that ran
        command: String,
        #[arg(long, default_value = "")]
        result: String,
        /// Record the command as failed
        #[arg(long)]
        failed: bool,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Record a modified file
    LogFile {
        task_name: String,
        file: String,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Replace the loop's overall progress line
    Progress {
        task_name: String,
        progress: String,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Mark a loop finished
    Complete {
        task_name: String,
        /// Mark the loop as failed instead of complete
        #[arg(long)]
        failed: bool,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Print one loop's record as JSON
    Status {
        task_name: String,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
}

impl LoopCommand {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Self::Init {
                task_name,
                task,
                promise,
                max_iterations,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.run_log()
                    .init_loop(task_name, task, promise, *max_iterations)?;
                println!("initialized loop {task_name}");
                Ok(())
            }
            Self::Update {
                task_name,
                iteration,
                completed,
                attempted,
                remaining,
                verification,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.run_log().update_iteration(
                    task_name,
                    *iteration,
                    IterationNote {
                        completed: completed.clone(),
                        attempted: attempted.clone(),
                        remaining: remaining.clone(),
                        verification_results: verification.clone(),
                        timestamp: None,
                    },
                )?;
                println!("recorded iteration {iteration} for {task_name}");
                Ok(())
            }
            Self::LogCommand {
                task_name,
                command,
                result,
                failed,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.run_log()
                    .log_command(task_name, command, result, !failed)?;
                Ok(())
            }
            Self::LogFile {
                task_name,
                file,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.run_log().log_file_modified(task_name, file)?;
                Ok(())
            }
            Self::Progress {
                task_name,
                progress,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.run_log().update_progress(task_name, progress)?;
                Ok(())
            }
            Self::Complete {
                task_name,
                failed,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.run_log().complete_loop(task_name, !failed)?;
                println!(
                    "loop {task_name}: {}",
                    if *failed { "error" } else { "complete" }
                );
                Ok(())
            }
            Self::Status {
                task_name,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                let Some(record) = ws.run_log().loop_status(task_name) else {
                    return Err(ExitError::NotFound(format!("loop {task_name:?}")).into());
                };
                println!("{}", serde_json::to_string_pretty(&record)?);
                Ok(())
            }
        }
    }
}
