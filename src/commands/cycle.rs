use std::path::PathBuf;

use clap::Subcommand;

use super::Workspace;

#[derive(Debug, Subcommand)]
pub enum CycleCommand {
    /// Mark a cycle as started
    Start {
        /// Cycle number
        cycle: u64,
        /// Project root directory
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Mark a cycle as finished
    Complete {
        cycle: u64,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Point the orchestrator at the agent currently taking a turn;
    /// omit the id to clear the pointer
    SetAgent {
        id: Option<String>,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
}

impl CycleCommand {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Self::Start {
                cycle,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.store()?.mark_cycle_start(*cycle)?;
                println!("cycle {cycle}: started");
                Ok(())
            }
            Self::Complete {
                cycle,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.store()?.mark_cycle_complete(*cycle)?;
                println!("cycle {cycle}: complete");
                Ok(())
            }
            Self::SetAgent { id, project_root } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.store()?.set_current_agent(id.as_deref())?;
                match id {
                    Some(id) => println!("current agent: {id}"),
                    None => println!("current agent cleared"),
                }
                Ok(())
            }
        }
    }
}
