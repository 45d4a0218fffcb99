use std::path::PathBuf;

use clap::Args;

use super::Workspace;
use crate::checkpoint::{CheckpointOutcome, Checkpointer, GitCheckpointer};

#[derive(Debug, Args)]
pub struct CheckpointArgs {
    /// Agent id recorded in the commit message
    pub agent_id: String,
    /// Checkpoint description
    #[arg(long)]
    pub message: String,
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
}

impl CheckpointArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let ws = Workspace::resolve(self.project_root.as_deref())?;
        let checkpointer = GitCheckpointer::new(&ws.root);
        match checkpointer.checkpoint(&self.agent_id, &self.message)? {
            CheckpointOutcome::Committed => {
                println!("checkpoint committed: [{}] {}", self.agent_id, self.message);
            }
            CheckpointOutcome::NothingToCommit => {
                println!("nothing to commit");
            }
            CheckpointOutcome::Unavailable => {
                println!("version control unavailable, checkpoint skipped");
            }
        }
        Ok(())
    }
}
