use std::path::PathBuf;

use clap::Args;

use super::Workspace;
use crate::config::{Config, CONFIG_TOML};
use crate::error::ExitError;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
    /// Project name (defaults to the root directory's name)
    #[arg(long)]
    pub name: Option<String>,
    /// Comma-separated agent roster overriding the default
    #[arg(long, value_delimiter = ',')]
    pub agents: Option<Vec<String>>,
    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let root = self
            .project_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let config_path = root.join(CONFIG_TOML);
        if config_path.exists() && !self.force {
            return Err(ExitError::Config(format!(
                "{} already exists (use --force to overwrite)",
                config_path.display()
            ))
            .into());
        }

        let name = self.name.clone().unwrap_or_else(|| {
            root.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "project".to_string())
        });

        let mut config = Config::new(&name);
        if let Some(ref roster) = self.agents {
            let roster: Vec<String> = roster
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if roster.is_empty() {
                return Err(ExitError::Config("agent roster cannot be empty".to_string()).into());
            }
            config.agents.roster = roster;
        }

        std::fs::create_dir_all(&root)?;
        std::fs::write(&config_path, config.to_toml()?)?;
        println!("wrote {}", config_path.display());

        // Seed the status document and the scratchpad directory so the
        // dashboard has something to show before the first agent runs.
        let ws = Workspace {
            root: root.clone(),
            config,
        };
        let store = ws.store()?;
        println!("seeded {}", store.path().display());

        let pads = ws.scratchpads();
        for id in &ws.config.agents.roster {
            pads.read(id)?;
        }
        println!(
            "seeded {} scratchpads in {}",
            ws.config.agents.roster.len(),
            ws.config.scratchpad_dir(&root).display()
        );

        Ok(())
    }
}
