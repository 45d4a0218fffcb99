use std::path::{Path, PathBuf};

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ExitError;

/// Config file name constant.
pub const CONFIG_TOML: &str = ".pulse.toml";

/// Name of the status document inside the state directory.
pub const STATUS_FILE: &str = "status.json";

/// Name of the loop execution log inside the state directory.
pub const EXECUTION_LOG_FILE: &str = "execution_log.json";

/// Top-level .pulse.toml config.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    pub project: ProjectConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProjectConfig {
    pub name: String,
}

/// Agent roster. Ids outside the roster are still accepted by the store;
/// the roster only seeds the initial document and scopes `reset`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentsConfig {
    #[serde(default = "default_roster")]
    pub roster: Vec<String>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            roster: default_roster(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PathsConfig {
    /// State directory, relative to the project root.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Output paths for the compiled JS status asset, relative to the
    /// project root.
    #[serde(default = "default_status_js")]
    pub status_js: Vec<PathBuf>,
    /// Dashboard data file for the loop log, relative to the project root.
    #[serde(default = "default_dashboard_data")]
    pub dashboard_data: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            status_js: default_status_js(),
            dashboard_data: default_dashboard_data(),
        }
    }
}

fn default_version() -> String {
    "1".to_string()
}

fn default_roster() -> Vec<String> {
    [
        "frontend",
        "backend",
        "api",
        "styling",
        "testing",
        "security",
        "documentation",
        "deployment",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".pulse")
}

fn default_status_js() -> Vec<PathBuf> {
    vec![PathBuf::from("pulse_status.js")]
}

fn default_dashboard_data() -> PathBuf {
    PathBuf::from("pulse_status_data.json")
}

impl Config {
    /// Build a default config for a project name.
    pub fn new(name: &str) -> Self {
        Self {
            version: default_version(),
            project: ProjectConfig {
                name: name.to_string(),
            },
            agents: AgentsConfig::default(),
            paths: PathsConfig::default(),
        }
    }

    /// Load config from a specific path.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content)
            .map_err(|e| ExitError::Config(format!("{}: {e}", path.display())).into())
    }

    /// Load `.pulse.toml` from the project root, falling back to defaults
    /// when it does not exist. The default project name is the root
    /// directory's name.
    pub fn load_or_default(root: &Path) -> anyhow::Result<Self> {
        let path = root.join(CONFIG_TOML);
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!(root = %root.display(), "no {CONFIG_TOML}, using defaults");
            let name = root
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "project".to_string());
            Ok(Self::new(&name))
        }
    }

    /// Serialize to TOML for writing at init time.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("serializing config")
    }

    /// Absolute state directory for a project root.
    pub fn state_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.state_dir)
    }

    /// Scratchpad directory inside the state dir.
    pub fn scratchpad_dir(&self, root: &Path) -> PathBuf {
        self.state_dir(root).join("scratchpads")
    }

    /// Path of the JSON status document.
    pub fn status_file(&self, root: &Path) -> PathBuf {
        self.state_dir(root).join(STATUS_FILE)
    }

    /// Path of the loop execution log.
    pub fn execution_log(&self, root: &Path) -> PathBuf {
        self.state_dir(root).join(EXECUTION_LOG_FILE)
    }

    /// Resolved output paths for the compiled JS asset.
    pub fn status_js_outputs(&self, root: &Path) -> Vec<PathBuf> {
        self.paths.status_js.iter().map(|p| root.join(p)).collect()
    }

    /// Resolved dashboard data path for the loop log.
    pub fn dashboard_data(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.dashboard_data)
    }
}
