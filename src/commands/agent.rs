use std::path::PathBuf;

use clap::Subcommand;

use super::status::OutputFormat;
use super::Workspace;
use crate::error::ExitError;
use crate::store::{AgentPatch, AgentState};

#[derive(Debug, Subcommand)]
pub enum AgentCommand {
    /// Apply a field-level update to an agent record
    Update {
        /// Agent id
        id: String,
        /// New lifecycle state
        #[arg(long, value_enum)]
        status: Option<AgentState>,
        /// Progress percentage; clamped to 0-100
        #[arg(long, allow_negative_numbers = true)]
        progress: Option<i64>,
        /// Human-readable status message
        #[arg(long)]
        message: Option<String>,
        /// Project root directory
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Mark an agent as running
    Start {
        id: String,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Mark an agent as complete
    Complete {
        id: String,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Mark an agent as errored
    Fail {
        id: String,
        /// Error description, recorded in the agent's message field
        #[arg(long)]
        message: String,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Print one agent's record
    Show {
        id: String,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
}

impl AgentCommand {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Self::Update {
                id,
                status,
                progress,
                message,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.store()?.update_agent(
                    id,
                    &AgentPatch {
                        status: *status,
                        progress: *progress,
                        message: message.clone(),
                        ..AgentPatch::default()
                    },
                )?;
                println!("updated {id}");
                Ok(())
            }
            Self::Start {
                id,
                message,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.store()?.update_agent(
                    id,
                    &AgentPatch {
                        status: Some(AgentState::Running),
                        progress: Some(0),
                        message: Some(
                            message
                                .clone()
                                .unwrap_or_else(|| format!("Running {id} agent...")),
                        ),
                        ..AgentPatch::default()
                    },
                )?;
                println!("{id}: running");
                Ok(())
            }
            Self::Complete {
                id,
                message,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.store()?.update_agent(
                    id,
                    &AgentPatch {
                        status: Some(AgentState::Complete),
                        message: Some(
                            message
                                .clone()
                                .unwrap_or_else(|| format!("Completed {id} work")),
                        ),
                        ..AgentPatch::default()
                    },
                )?;
                println!("{id}: complete");
                Ok(())
            }
            Self::Fail {
                id,
                message,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.store()?.update_agent(
                    id,
                    &AgentPatch {
                        status: Some(AgentState::Error),
                        message: Some(format!("Error: {message}")),
                        ..AgentPatch::default()
                    },
                )?;
                println!("{id}: error");
                Ok(())
            }
            Self::Show {
                id,
                format,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                let doc = ws.store()?.read()?;
                let Some(agent) = doc.agents.get(id) else {
                    return Err(ExitError::NotFound(format!("agent {id:?}")).into());
                };
                match format.unwrap_or(OutputFormat::Json) {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(agent)?);
                    }
                    OutputFormat::Pretty | OutputFormat::Text => {
                        println!(
                            "{id}  status={}  progress={}%  runs={}  ok={}  err={}",
                            agent.status.as_str(),
                            agent.progress,
                            agent.total_runs,
                            agent.success_count,
                            agent.error_count,
                        );
                        println!("message: {}", agent.message);
                    }
                }
                Ok(())
            }
        }
    }
}
