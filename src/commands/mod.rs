pub mod agent;
pub mod checkpoint;
pub mod compile;
pub mod cycle;
pub mod init;
pub mod pad;
pub mod reset;
pub mod run_log;
pub mod schema;
pub mod status;

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::runlog::RunLog;
use crate::scratchpad::ScratchpadStore;
use crate::store::StatusStore;

/// Resolved project context shared by the commands: root directory plus
/// loaded (or defaulted) config.
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
}

impl Workspace {
    pub fn resolve(project_root: Option<&Path>) -> anyhow::Result<Self> {
        let root = project_root.map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let config = Config::load_or_default(&root)?;
        Ok(Self { root, config })
    }

    pub fn store(&self) -> anyhow::Result<StatusStore> {
        StatusStore::open(
            self.config.status_file(&self.root),
            self.config.agents.roster.clone(),
        )
    }

    pub fn scratchpads(&self) -> ScratchpadStore {
        ScratchpadStore::new(
            self.config.scratchpad_dir(&self.root),
            &self.config.project.name,
        )
    }

    pub fn run_log(&self) -> RunLog {
        RunLog::open(
            self.config.execution_log(&self.root),
            self.config.dashboard_data(&self.root),
        )
    }
}
