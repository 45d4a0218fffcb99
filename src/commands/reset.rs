use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Args;

use super::Workspace;

#[derive(Debug, Args)]
pub struct ResetArgs {
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

impl ResetArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        if !self.yes && std::io::stdin().is_terminal() {
            let confirmed = dialoguer::Confirm::new()
                .with_prompt("Reset all agents and the orchestrator to defaults?")
                .default(false)
                .interact()?;
            if !confirmed {
                println!("aborted");
                return Ok(());
            }
        }

        let ws = Workspace::resolve(self.project_root.as_deref())?;
        ws.store()?.reset_all()?;
        println!("all agents reset to idle");
        Ok(())
    }
}
