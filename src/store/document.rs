use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version stamped into `metadata.version`.
pub const DOCUMENT_VERSION: &str = "2.0";

/// Number of progress samples retained per agent.
pub const PROGRESS_HISTORY_LIMIT: usize = 10;

/// Orchestrator run state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    #[default]
    Idle,
    Running,
    Error,
}

impl OrchestratorState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Error => "error",
        }
    }
}

/// Per-agent lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    #[default]
    Idle,
    Running,
    Complete,
    Error,
}

impl AgentState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

/// One timestamped progress sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSample {
    pub progress: u8,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Tracked state for one agent id.
///
/// Fields are serde-defaulted so documents written by older versions of the
/// schema still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentStatus {
    pub status: AgentState,
    pub progress: u8,
    pub message: String,
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<DateTime<Utc>>,
    pub last_status_change: Option<DateTime<Utc>>,
    pub total_runs: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub progress_history: Vec<ProgressSample>,
    pub performance_metrics: BTreeMap<String, serde_json::Value>,
}

impl Default for AgentStatus {
    fn default() -> Self {
        Self {
            status: AgentState::Idle,
            progress: 0,
            message: "Ready".to_string(),
            last_run: None,
            last_success: None,
            last_error: None,
            last_status_change: None,
            total_runs: 0,
            success_count: 0,
            error_count: 0,
            progress_history: Vec::new(),
            performance_metrics: default_metrics(),
        }
    }
}

fn default_metrics() -> BTreeMap<String, serde_json::Value> {
    let mut metrics = BTreeMap::new();
    metrics.insert("avg_execution_time".to_string(), serde_json::json!(0));
    metrics.insert("success_rate".to_string(), serde_json::json!(100.0));
    metrics.insert("files_modified_avg".to_string(), serde_json::json!(0));
    metrics
}

impl AgentStatus {
    /// Fresh record for a newly registered agent id.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_status_change: Some(now),
            ..Self::default()
        }
    }

    /// Apply a patch. Field writes are last-write-wins; status transitions
    /// stamp their timestamp and bump their counter; a progress write is
    /// clamped and appended to the bounded history.
    pub fn apply(&mut self, patch: &AgentPatch, now: DateTime<Utc>) {
        if let Some(ref message) = patch.message {
            self.message = message.clone();
        }

        if let Some(state) = patch.status {
            self.status = state;
            match state {
                AgentState::Running => {
                    self.last_run = Some(now);
                    self.last_status_change = Some(now);
                    self.total_runs += 1;
                }
                AgentState::Complete => {
                    self.last_success = Some(now);
                    self.last_status_change = Some(now);
                    self.success_count += 1;
                }
                AgentState::Error => {
                    self.last_error = Some(now);
                    self.last_status_change = Some(now);
                    self.error_count += 1;
                }
                AgentState::Idle => {}
            }
        }

        if let Some(progress) = patch.progress {
            let clamped = u8::try_from(progress.clamp(0, 100)).unwrap_or(100);
            self.progress = clamped;
            self.progress_history.push(ProgressSample {
                progress: clamped,
                timestamp: now,
                message: patch.message.clone().unwrap_or_default(),
            });
            if self.progress_history.len() > PROGRESS_HISTORY_LIMIT {
                let excess = self.progress_history.len() - PROGRESS_HISTORY_LIMIT;
                self.progress_history.drain(..excess);
            }
        }

        if let Some(ref metrics) = patch.performance_metrics {
            for (key, value) in metrics {
                self.performance_metrics
                    .insert(key.clone(), value.clone());
            }
        }
    }
}

/// Set-only-what-changed update for an agent record.
#[derive(Debug, Clone, Default)]
pub struct AgentPatch {
    pub status: Option<AgentState>,
    /// Clamped to [0, 100] on apply.
    pub progress: Option<i64>,
    pub message: Option<String>,
    /// Merged by key into the existing metrics map.
    pub performance_metrics: Option<BTreeMap<String, serde_json::Value>>,
}

/// Global orchestrator record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorRecord {
    pub status: OrchestratorState,
    pub current_cycle: u64,
    pub current_agent: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub last_update: DateTime<Utc>,
    pub total_cycles_run: u64,
    pub auto_mode: bool,
}

impl OrchestratorRecord {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: OrchestratorState::Idle,
            current_cycle: 0,
            current_agent: None,
            start_time: None,
            last_update: now,
            total_cycles_run: 0,
            auto_mode: false,
        }
    }

    /// Apply a patch; `last_update` refreshes to `now` unless the patch
    /// supplies one.
    pub fn apply(&mut self, patch: &OrchestratorPatch, now: DateTime<Utc>) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(cycle) = patch.current_cycle {
            self.current_cycle = cycle;
        }
        if let Some(ref agent) = patch.current_agent {
            self.current_agent = agent.clone();
        }
        if let Some(start) = patch.start_time {
            self.start_time = start;
        }
        if let Some(total) = patch.total_cycles_run {
            self.total_cycles_run = total;
        }
        if let Some(auto) = patch.auto_mode {
            self.auto_mode = auto;
        }
        self.last_update = patch.last_update.unwrap_or(now);
    }
}

/// Set-only-what-changed update for the orchestrator record.
///
/// Nullable fields use a double Option: the outer layer is "touch this
/// field at all", the inner is the stored value.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorPatch {
    pub status: Option<OrchestratorState>,
    pub current_cycle: Option<u64>,
    pub current_agent: Option<Option<String>>,
    pub start_time: Option<Option<DateTime<Utc>>>,
    pub last_update: Option<DateTime<Utc>>,
    pub total_cycles_run: Option<u64>,
    pub auto_mode: Option<bool>,
}

/// Document bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// The persisted root entity: one orchestrator record, a map of agent
/// records, and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDocument {
    pub orchestrator: OrchestratorRecord,
    pub agents: BTreeMap<String, AgentStatus>,
    pub metadata: Metadata,
}

impl StatusDocument {
    /// Default document seeded with the configured roster.
    pub fn new(roster: &[String], now: DateTime<Utc>) -> Self {
        let agents = roster
            .iter()
            .map(|id| (id.clone(), AgentStatus::new(now)))
            .collect();
        Self {
            orchestrator: OrchestratorRecord::new(now),
            agents,
            metadata: Metadata {
                version: DOCUMENT_VERSION.to_string(),
                created_at: now,
                last_modified: now,
            },
        }
    }

    /// Fetch an agent record, lazily creating a default one for unknown ids.
    pub fn agent_mut(&mut self, id: &str, now: DateTime<Utc>) -> &mut AgentStatus {
        self.agents
            .entry(id.to_string())
            .or_insert_with(|| AgentStatus::new(now))
    }

    /// Refresh `metadata.last_modified`; called on every persist.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.metadata.last_modified = now;
    }
}

/// Derived counts for CLI display.
#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub orchestrator_status: OrchestratorState,
    pub current_cycle: u64,
    pub current_agent: Option<String>,
    pub agents_running: usize,
    pub agents_complete: usize,
    pub agents_error: usize,
    pub total_agents: usize,
    pub last_update: DateTime<Utc>,
}

impl StatusSummary {
    pub fn from_document(doc: &StatusDocument) -> Self {
        let count = |state: AgentState| doc.agents.values().filter(|a| a.status == state).count();
        Self {
            orchestrator_status: doc.orchestrator.status,
            current_cycle: doc.orchestrator.current_cycle,
            current_agent: doc.orchestrator.current_agent.clone(),
            agents_running: count(AgentState::Running),
            agents_complete: count(AgentState::Complete),
            agents_error: count(AgentState::Error),
            total_agents: doc.agents.len(),
            last_update: doc.orchestrator.last_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn running_transition_stamps_and_counts() {
        let t = now();
        let mut agent = AgentStatus::new(t);
        agent.apply(
            &AgentPatch {
                status: Some(AgentState::Running),
                message: Some("working".to_string()),
                ..AgentPatch::default()
            },
            t,
        );
        assert_eq!(agent.status, AgentState::Running);
        assert_eq!(agent.last_run, Some(t));
        assert_eq!(agent.last_status_change, Some(t));
        assert_eq!(agent.total_runs, 1);
        assert_eq!(agent.message, "working");
        assert_eq!(agent.last_success, None);
        assert_eq!(agent.last_error, None);
    }

    #[test]
    fn complete_and_error_transitions() {
        let t = now();
        let mut agent = AgentStatus::new(t);
        agent.apply(
            &AgentPatch {
                status: Some(AgentState::Complete),
                ..AgentPatch::default()
            },
            t,
        );
        assert_eq!(agent.last_success, Some(t));
        assert_eq!(agent.success_count, 1);

        agent.apply(
            &AgentPatch {
                status: Some(AgentState::Error),
                ..AgentPatch::default()
            },
            t,
        );
        assert_eq!(agent.last_error, Some(t));
        assert_eq!(agent.error_count, 1);
    }

    #[test]
    fn idle_does_not_stamp_status_change() {
        let t = now();
        let mut agent = AgentStatus::default();
        agent.apply(
            &AgentPatch {
                status: Some(AgentState::Idle),
                ..AgentPatch::default()
            },
            t,
        );
        assert_eq!(agent.last_status_change, None);
    }

    #[test]
    fn progress_is_clamped() {
        let t = now();
        let mut agent = AgentStatus::new(t);
        agent.apply(
            &AgentPatch {
                progress: Some(250),
                ..AgentPatch::default()
            },
            t,
        );
        assert_eq!(agent.progress, 100);

        agent.apply(
            &AgentPatch {
                progress: Some(-5),
                ..AgentPatch::default()
            },
            t,
        );
        assert_eq!(agent.progress, 0);
    }

    #[test]
    fn progress_history_keeps_most_recent_ten() {
        let t = now();
        let mut agent = AgentStatus::new(t);
        for i in 0..15 {
            agent.apply(
                &AgentPatch {
                    progress: Some(i),
                    ..AgentPatch::default()
                },
                t,
            );
        }
        assert_eq!(agent.progress_history.len(), PROGRESS_HISTORY_LIMIT);
        let kept: Vec<u8> = agent.progress_history.iter().map(|s| s.progress).collect();
        assert_eq!(kept, (5..15).collect::<Vec<u8>>());
    }

    #[test]
    fn metrics_merge_by_key() {
        let t = now();
        let mut agent = AgentStatus::new(t);
        let mut patch_metrics = BTreeMap::new();
        patch_metrics.insert("success_rate".to_string(), serde_json::json!(50.0));
        patch_metrics.insert("files_touched".to_string(), serde_json::json!(3));
        agent.apply(
            &AgentPatch {
                performance_metrics: Some(patch_metrics),
                ..AgentPatch::default()
            },
            t,
        );
        assert_eq!(
            agent.performance_metrics["success_rate"],
            serde_json::json!(50.0)
        );
        assert_eq!(
            agent.performance_metrics["files_touched"],
            serde_json::json!(3)
        );
        // Untouched defaults survive
        assert!(agent.performance_metrics.contains_key("avg_execution_time"));
    }

    #[test]
    fn orchestrator_patch_refreshes_last_update() {
        let t0 = now();
        let mut orch = OrchestratorRecord::new(t0);
        let t1 = t0 + chrono::Duration::seconds(5);
        orch.apply(
            &OrchestratorPatch {
                status: Some(OrchestratorState::Running),
                current_agent: Some(Some("backend".to_string())),
                ..OrchestratorPatch::default()
            },
            t1,
        );
        assert_eq!(orch.status, OrchestratorState::Running);
        assert_eq!(orch.current_agent.as_deref(), Some("backend"));
        assert_eq!(orch.last_update, t1);
    }

    #[test]
    fn orchestrator_patch_honors_explicit_last_update() {
        let t0 = now();
        let mut orch = OrchestratorRecord::new(t0);
        let explicit = t0 + chrono::Duration::seconds(30);
        orch.apply(
            &OrchestratorPatch {
                last_update: Some(explicit),
                ..OrchestratorPatch::default()
            },
            t0 + chrono::Duration::seconds(60),
        );
        assert_eq!(orch.last_update, explicit);
    }

    #[test]
    fn summary_counts_by_state() {
        let t = now();
        let roster = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut doc = StatusDocument::new(&roster, t);
        doc.agent_mut("a", t).status = AgentState::Running;
        doc.agent_mut("b", t).status = AgentState::Complete;
        let summary = StatusSummary::from_document(&doc);
        assert_eq!(summary.agents_running, 1);
        assert_eq!(summary.agents_complete, 1);
        assert_eq!(summary.agents_error, 0);
        assert_eq!(summary.total_agents, 3);
    }

    #[test]
    fn old_documents_with_missing_fields_deserialize() {
        let json = r#"{"status": "running", "progress": 40}"#;
        let agent: AgentStatus = serde_json::from_str(json).unwrap();
        assert_eq!(agent.status, AgentState::Running);
        assert_eq!(agent.progress, 40);
        assert_eq!(agent.total_runs, 0);
        assert!(agent.progress_history.is_empty());
    }
}
