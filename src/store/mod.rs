//! Thread-safe, file-backed status store.
//!
//! A single JSON document is the source of truth for orchestration state.
//! Every mutating operation is a read-modify-write under one mutex
//! acquisition, and every write replaces the whole document atomically, so
//! concurrent callers in the same process never lose updates and external
//! readers never see a torn file. Corrupt or missing documents heal to
//! defaults on read; failed writes propagate.

mod document;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use chrono::Utc;

pub use document::{
    AgentPatch, AgentState, AgentStatus, Metadata, OrchestratorPatch, OrchestratorRecord,
    OrchestratorState, ProgressSample, StatusDocument, StatusSummary, DOCUMENT_VERSION,
    PROGRESS_HISTORY_LIMIT,
};

use crate::fsutil::write_atomic;

pub struct StatusStore {
    path: PathBuf,
    roster: Vec<String>,
    lock: Mutex<()>,
}

impl StatusStore {
    /// Open the store backed by `status_file`, seeding a default document
    /// from the roster when none exists yet.
    pub fn open(status_file: PathBuf, roster: Vec<String>) -> anyhow::Result<Self> {
        let store = Self {
            path: status_file,
            roster,
            lock: Mutex::new(()),
        };
        if !store.path.exists() {
            let _guard = store.acquire();
            let mut doc = StatusDocument::new(&store.roster, Utc::now());
            store.persist(&mut doc)?;
        }
        Ok(store)
    }

    /// Path of the backing JSON document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Agent ids the store was initialized with.
    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// Current document, as a value copy.
    pub fn read(&self) -> anyhow::Result<StatusDocument> {
        let _guard = self.acquire();
        self.load_or_heal()
    }

    /// Apply a patch to one agent record. Unknown ids get a default record
    /// first. The whole read-modify-write happens under one lock
    /// acquisition.
    pub fn update_agent(&self, id: &str, patch: &AgentPatch) -> anyhow::Result<()> {
        let _guard = self.acquire();
        let mut doc = self.load_or_heal()?;
        let now = Utc::now();
        doc.agent_mut(id, now).apply(patch, now);
        doc.orchestrator.last_update = now;
        self.persist(&mut doc)
    }

    /// Apply a patch to the orchestrator record. Pointing `current_agent`
    /// at an unknown id registers that id with a default record, keeping
    /// the pointer valid.
    pub fn update_orchestrator(&self, patch: &OrchestratorPatch) -> anyhow::Result<()> {
        let _guard = self.acquire();
        let mut doc = self.load_or_heal()?;
        let now = Utc::now();
        if let Some(Some(ref id)) = patch.current_agent {
            doc.agent_mut(id, now);
        }
        doc.orchestrator.apply(patch, now);
        self.persist(&mut doc)
    }

    /// Mark a cycle as started: orchestrator running, agent pointer
    /// cleared, start time stamped.
    pub fn mark_cycle_start(&self, cycle: u64) -> anyhow::Result<()> {
        let _guard = self.acquire();
        let mut doc = self.load_or_heal()?;
        let now = Utc::now();
        doc.orchestrator.status = OrchestratorState::Running;
        doc.orchestrator.current_cycle = cycle;
        doc.orchestrator.current_agent = None;
        doc.orchestrator.start_time = Some(now);
        doc.orchestrator.last_update = now;
        self.persist(&mut doc)
    }

    /// Mark a cycle as finished: orchestrator idle, pointers cleared,
    /// lifetime cycle counter bumped.
    pub fn mark_cycle_complete(&self, cycle: u64) -> anyhow::Result<()> {
        let _guard = self.acquire();
        let mut doc = self.load_or_heal()?;
        let now = Utc::now();
        doc.orchestrator.status = OrchestratorState::Idle;
        doc.orchestrator.current_cycle = cycle;
        doc.orchestrator.current_agent = None;
        doc.orchestrator.start_time = None;
        doc.orchestrator.total_cycles_run += 1;
        doc.orchestrator.last_update = now;
        self.persist(&mut doc)
    }

    /// Point the orchestrator at the agent currently taking a turn.
    pub fn set_current_agent(&self, id: Option<&str>) -> anyhow::Result<()> {
        self.update_orchestrator(&OrchestratorPatch {
            current_agent: Some(id.map(ToString::to_string)),
            ..OrchestratorPatch::default()
        })
    }

    /// Derived counts for display.
    pub fn summary(&self) -> anyhow::Result<StatusSummary> {
        Ok(StatusSummary::from_document(&self.read()?))
    }

    /// Reset every known agent to defaults and the orchestrator to idle.
    /// Test/debug recovery, not part of normal operation.
    pub fn reset_all(&self) -> anyhow::Result<()> {
        let _guard = self.acquire();
        let mut doc = self.load_or_heal()?;
        let now = Utc::now();
        for record in doc.agents.values_mut() {
            *record = AgentStatus::new(now);
        }
        for id in &self.roster {
            doc.agent_mut(id, now);
        }
        doc.orchestrator.status = OrchestratorState::Idle;
        doc.orchestrator.current_agent = None;
        doc.orchestrator.start_time = None;
        doc.orchestrator.last_update = now;
        self.persist(&mut doc)
    }

    fn acquire(&self) -> std::sync::MutexGuard<'_, ()> {
        // The guarded state lives on disk; a panic mid-operation cannot
        // leave the in-memory side inconsistent, so poisoning is recovered.
        self.lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Load the document, healing a missing or corrupt file back to the
    /// default. Caller must hold the lock.
    fn load_or_heal(&self) -> anyhow::Result<StatusDocument> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(doc) => Ok(doc),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "status document corrupt, reinitializing"
                    );
                    self.reinitialize()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.reinitialize(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "status document unreadable, reinitializing"
                );
                self.reinitialize()
            }
        }
    }

    fn reinitialize(&self) -> anyhow::Result<StatusDocument> {
        let mut doc = StatusDocument::new(&self.roster, Utc::now());
        self.persist(&mut doc)?;
        Ok(doc)
    }

    /// Serialize and atomically replace the backing file, refreshing
    /// `metadata.last_modified`. Caller must hold the lock.
    fn persist(&self, doc: &mut StatusDocument) -> anyhow::Result<()> {
        doc.touch(Utc::now());
        let mut json = serde_json::to_string_pretty(doc).context("serializing status document")?;
        json.push('\n');
        write_atomic(&self.path, &json)
            .with_context(|| format!("persisting {}", self.path.display()))
    }
}
