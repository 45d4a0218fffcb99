//! Loop execution log: per-task run records for the live dashboard.
//!
//! Documents are keyed by task name. Every save also regenerates the
//! dashboard data file so the static page stays in sync with the log.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExitError;
use crate::fsutil::write_atomic;

/// Number of command entries retained per loop.
pub const COMMAND_LOG_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    #[default]
    Initializing,
    Running,
    Complete,
    Error,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalStats {
    pub total_loops: u64,
    pub completed_loops: u64,
    pub total_iterations: u64,
    pub total_commands: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationNote {
    pub completed: Vec<String>,
    pub attempted: Vec<String>,
    pub remaining: Vec<String>,
    pub verification_results: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEntry {
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub result: String,
    pub success: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopRecord {
    pub task_name: String,
    pub task: String,
    pub completion_promise: String,
    pub max_iterations: u32,
    pub current_iteration: u32,
    pub status: LoopState,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub iteration_notes: BTreeMap<u32, IterationNote>,
    pub files_modified: Vec<String>,
    pub commands_executed: Vec<CommandEntry>,
    pub overall_progress: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLogDocument {
    pub loops: BTreeMap<String, LoopRecord>,
    pub global_stats: GlobalStats,
}

/// Dashboard-facing projection of the log.
#[derive(Debug, Serialize)]
struct DashboardData<'a> {
    loops: Vec<&'a LoopRecord>,
    last_updated: DateTime<Utc>,
}

pub struct RunLog {
    log_path: PathBuf,
    dashboard_path: PathBuf,
    lock: Mutex<()>,
}

impl RunLog {
    pub fn open(log_path: PathBuf, dashboard_path: PathBuf) -> Self {
        Self {
            log_path,
            dashboard_path,
            lock: Mutex::new(()),
        }
    }

    /// Current log document; missing or corrupt files read as empty.
    pub fn read(&self) -> RunLogDocument {
        let _guard = self.acquire();
        self.load()
    }

    /// Record for one task, if it exists.
    pub fn loop_status(&self, task_name: &str) -> Option<LoopRecord> {
        self.read().loops.get(task_name).cloned()
    }

    /// Register a new loop. Re-initializing an existing task name restarts
    /// its record.
    pub fn init_loop(
        &self,
        task_name: &str,
        task: &str,
        completion_promise: &str,
        max_iterations: u32,
    ) -> anyhow::Result<()> {
        let _guard = self.acquire();
        let mut doc = self.load();
        let now = Utc::now();
        doc.loops.insert(
            task_name.to_string(),
            LoopRecord {
                task_name: task_name.to_string(),
                task: task.to_string(),
                completion_promise: completion_promise.to_string(),
                max_iterations,
                start_time: Some(now),
                overall_progress: "0% complete - Loop initialized".to_string(),
                ..LoopRecord::default()
            },
        );
        doc.global_stats.total_loops += 1;
        self.save(&mut doc)
    }

    /// Record one iteration's notes and advance the iteration counter.
    pub fn update_iteration(
        &self,
        task_name: &str,
        iteration: u32,
        note: IterationNote,
    ) -> anyhow::Result<()> {
        self.mutate(task_name, |record, stats, now| {
            record.current_iteration = iteration;
            record.status = LoopState::Running;
            record.iteration_notes.insert(
                iteration,
                IterationNote {
                    timestamp: Some(now),
                    ..note
                },
            );
            stats.total_iterations += 1;
        })
    }

    /// Record a file touched by the loop; duplicates are ignored.
    pub fn log_file_modified(&self, task_name: &str, file_path: &str) -> anyhow::Result<()> {
        self.mutate(task_name, |record, _, _| {
            if !record.files_modified.iter().any(|f| f == file_path) {
                record.files_modified.push(file_path.to_string());
            }
        })
    }

    /// Record a command execution; only the most recent
    /// [`COMMAND_LOG_LIMIT`] entries are retained.
    pub fn log_command(
        &self,
        task_name: &str,
        command: &str,
        result: &str,
        success: bool,
    ) -> anyhow::Result<()> {
        self.mutate(task_name, |record, stats, now| {
            record.commands_executed.push(CommandEntry {
                timestamp: now,
                command: command.to_string(),
                result: result.to_string(),
                success,
            });
            if record.commands_executed.len() > COMMAND_LOG_LIMIT {
                let excess = record.commands_executed.len() - COMMAND_LOG_LIMIT;
                record.commands_executed.drain(..excess);
            }
            stats.total_commands += 1;
        })
    }

    /// Replace the loop's overall progress line.
    pub fn update_progress(&self, task_name: &str, progress: &str) -> anyhow::Result<()> {
        self.mutate(task_name, |record, _, _| {
            record.overall_progress = progress.to_string();
        })
    }

    /// Mark a loop finished, successfully or not.
    pub fn complete_loop(&self, task_name: &str, success: bool) -> anyhow::Result<()> {
        self.mutate(task_name, |record, stats, now| {
            record.status = if success {
                LoopState::Complete
            } else {
                LoopState::Error
            };
            record.end_time = Some(now);
            record.overall_progress = if success {
                "100% complete - Task finished successfully".to_string()
            } else {
                "Failed - Task did not complete".to_string()
            };
            if success {
                stats.completed_loops += 1;
            }
        })
    }

    /// Lock, load, mutate one record under the global stats, save.
    /// Unknown task names are an error (the CLI maps this to a non-zero
    /// exit).
    fn mutate(
        &self,
        task_name: &str,
        apply: impl FnOnce(&mut LoopRecord, &mut GlobalStats, DateTime<Utc>),
    ) -> anyhow::Result<()> {
        let _guard = self.acquire();
        let mut doc = self.load();
        let now = Utc::now();
        let Some(record) = doc.loops.get_mut(task_name) else {
            return Err(ExitError::NotFound(format!("loop {task_name:?}")).into());
        };
        apply(record, &mut doc.global_stats, now);
        self.save(&mut doc)
    }

    fn acquire(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn load(&self) -> RunLogDocument {
        match std::fs::read_to_string(&self.log_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %self.log_path.display(),
                    error = %e,
                    "execution log corrupt, starting empty"
                );
                RunLogDocument::default()
            }),
            Err(_) => RunLogDocument::default(),
        }
    }

    fn save(&self, doc: &mut RunLogDocument) -> anyhow::Result<()> {
        let now = Utc::now();
        doc.global_stats.last_updated = Some(now);

        let mut json =
            serde_json::to_string_pretty(doc).context("serializing execution log")?;
        json.push('\n');
        write_atomic(&self.log_path, &json)
            .with_context(|| format!("persisting {}", self.log_path.display()))?;

        let dashboard = DashboardData {
            loops: doc.loops.values().collect(),
            last_updated: now,
        };
        let mut dashboard_json =
            serde_json::to_string_pretty(&dashboard).context("serializing dashboard data")?;
        dashboard_json.push('\n');
        write_atomic(&self.dashboard_path, &dashboard_json)
            .with_context(|| format!("persisting {}", self.dashboard_path.display()))
    }
}
