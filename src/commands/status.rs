use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Args;

use super::Workspace;
use crate::store::{AgentState, StatusDocument, StatusSummary};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl StatusArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let format = self.format.unwrap_or_else(|| {
            if std::io::stdout().is_terminal() {
                OutputFormat::Pretty
            } else {
                OutputFormat::Text
            }
        });

        let ws = Workspace::resolve(self.project_root.as_deref())?;
        let store = ws.store()?;
        let doc = store.read()?;
        let summary = StatusSummary::from_document(&doc);

        match format {
            OutputFormat::Pretty => print_pretty(&ws, &doc, &summary),
            OutputFormat::Text => print_text(&doc, &summary),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&doc)?),
        }

        Ok(())
    }
}

fn state_marker(state: AgentState) -> &'static str {
    match state {
        AgentState::Idle => " ",
        AgentState::Running => ">",
        AgentState::Complete => "+",
        AgentState::Error => "!",
    }
}

/// Truncation is display-only; stored messages keep their full length.
fn truncate(message: &str, limit: usize) -> String {
    if message.chars().count() > limit {
        let cut: String = message.chars().take(limit).collect();
        format!("{cut}...")
    } else {
        message.to_string()
    }
}

fn print_pretty(ws: &Workspace, doc: &StatusDocument, summary: &StatusSummary) {
    println!("=== {} Status ===\n", ws.config.project.name);

    println!(
        "Orchestrator: {}  (cycle {}, {} total)",
        summary.orchestrator_status.as_str().to_uppercase(),
        summary.current_cycle,
        doc.orchestrator.total_cycles_run,
    );
    println!(
        "Current Agent: {}",
        summary.current_agent.as_deref().unwrap_or("none")
    );
    println!(
        "\nAgents: {} running, {} complete, {} error ({} total)",
        summary.agents_running, summary.agents_complete, summary.agents_error, summary.total_agents
    );

    for (id, agent) in &doc.agents {
        println!(
            "  {} {}: {} ({}%) - {}",
            state_marker(agent.status),
            id,
            agent.status.as_str(),
            agent.progress,
            truncate(&agent.message, 60),
        );
    }
}

fn print_text(doc: &StatusDocument, summary: &StatusSummary) {
    println!("pulse-status");
    println!(
        "orchestrator  status={}  cycle={}  current-agent={}",
        summary.orchestrator_status.as_str(),
        summary.current_cycle,
        summary.current_agent.as_deref().unwrap_or("-"),
    );
    println!(
        "agents  running={}  complete={}  error={}  total={}",
        summary.agents_running, summary.agents_complete, summary.agents_error, summary.total_agents
    );
    for (id, agent) in &doc.agents {
        println!(
            "agent  id={}  status={}  progress={}  runs={}",
            id,
            agent.status.as_str(),
            agent.progress,
            agent.total_runs,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_only_shortens_long_messages() {
        assert_eq!(truncate("short", 60), "short");
        let long = "x".repeat(70);
        let shown = truncate(&long, 60);
        assert_eq!(shown.chars().count(), 63);
        assert!(shown.ends_with("..."));
    }
}
