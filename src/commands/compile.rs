use std::path::PathBuf;

use clap::Args;

use super::Workspace;
use crate::compiler;
use crate::store::StatusSummary;

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
    /// Only print the summary, even if outputs were written
    #[arg(long)]
    pub quiet: bool,
}

impl CompileArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let ws = Workspace::resolve(self.project_root.as_deref())?;
        let store = ws.store()?;
        let outputs = ws.config.status_js_outputs(&ws.root);

        let (doc, report) = compiler::compile(&store, &outputs)?;

        if !self.quiet {
            for path in &report.written {
                println!("Generated: {}", path.display());
            }
            for path in &report.skipped {
                println!("Unchanged: {}", path.display());
            }
        }

        let summary = StatusSummary::from_document(&doc);
        println!("\n--- {} Orchestrator Status ---", ws.config.project.name);
        println!("Status: {}", summary.orchestrator_status.as_str().to_uppercase());
        println!("Cycle: {}", summary.current_cycle);
        println!(
            "Current Agent: {}",
            summary.current_agent.as_deref().unwrap_or("None")
        );
        println!(
            "\nAgents: {} running, {} complete, {} error",
            summary.agents_running, summary.agents_complete, summary.agents_error
        );
        for (id, agent) in &doc.agents {
            println!(
                "  {}: {} ({}%) - {}",
                id,
                agent.status.as_str(),
                agent.progress,
                agent.message,
            );
        }

        Ok(())
    }
}
