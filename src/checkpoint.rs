//! Version-control checkpoints for agent progress.
//!
//! Checkpointing is a capability: callers hold a `Checkpointer` and get a
//! tri-state outcome back, so "nothing to commit" and "tool missing" stay
//! distinguishable instead of collapsing into one boolean.

use std::path::{Path, PathBuf};

use crate::error::ExitError;
use crate::subprocess::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointOutcome {
    /// A commit was created.
    Committed,
    /// The working tree was clean; nothing staged.
    NothingToCommit,
    /// The version-control tool is missing or the directory is not a
    /// repository. A no-op, not an error.
    Unavailable,
}

pub trait Checkpointer {
    /// Stage all working-tree changes and commit them as
    /// `[<agent-id>] <message>`.
    fn checkpoint(&self, agent_id: &str, message: &str) -> anyhow::Result<CheckpointOutcome>;
}

/// Checkpointer backed by the `git` CLI.
pub struct GitCheckpointer {
    root: PathBuf,
}

impl GitCheckpointer {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn git(&self, args: &[&str]) -> anyhow::Result<crate::subprocess::RunOutput> {
        Tool::new("git").args(args).current_dir(&self.root).run()
    }
}

impl Checkpointer for GitCheckpointer {
    fn checkpoint(&self, agent_id: &str, message: &str) -> anyhow::Result<CheckpointOutcome> {
        let stage = match self.git(&["add", "-A"]) {
            Ok(output) => output,
            Err(e) if is_tool_missing(&e) => return Ok(CheckpointOutcome::Unavailable),
            Err(e) => return Err(e),
        };
        if !stage.success() {
            // Most commonly: not a git repository.
            tracing::debug!(stderr = %stage.stderr.trim(), "git add failed, checkpoint unavailable");
            return Ok(CheckpointOutcome::Unavailable);
        }

        // Exit 0: index matches HEAD, nothing staged. Exit 1: staged changes.
        let diff = self.git(&["diff", "--cached", "--quiet"])?;
        match diff.exit_code {
            0 => Ok(CheckpointOutcome::NothingToCommit),
            1 => {
                let commit_message = format!("[{agent_id}] {message}");
                let commit = self.git(&["commit", "-m", &commit_message])?;
                if commit.success() {
                    tracing::info!(agent = agent_id, "checkpoint committed");
                    Ok(CheckpointOutcome::Committed)
                } else {
                    // Staged changes exist but the commit failed; that is a
                    // real write failure, not a no-op.
                    Err(ExitError::ToolFailed {
                        tool: "git".to_string(),
                        code: commit.exit_code,
                        message: commit.stderr.trim().to_string(),
                    }
                    .into())
                }
            }
            _ => {
                tracing::debug!(stderr = %diff.stderr.trim(), "git diff failed, checkpoint unavailable");
                Ok(CheckpointOutcome::Unavailable)
            }
        }
    }
}

fn is_tool_missing(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<ExitError>(),
        Some(ExitError::ToolNotFound { .. })
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_available() -> bool {
        Tool::new("git")
            .arg("--version")
            .run()
            .is_ok_and(|out| out.success())
    }

    #[test]
    fn non_repository_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = GitCheckpointer::new(dir.path())
            .checkpoint("build", "progress")
            .unwrap();
        // Either git is missing entirely or the directory is not a repo;
        // both map to Unavailable.
        assert_eq!(outcome, CheckpointOutcome::Unavailable);
    }

    #[test]
    fn commit_then_clean_tree() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let run = |args: &[&str]| {
            Tool::new("git")
                .args(args)
                .current_dir(dir.path())
                .run_ok()
                .unwrap()
        };
        run(&["init", "-q"]);
        run(&["config", "user.email", "agent@example.com"]);
        run(&["config", "user.name", "agent"]);
        std::fs::write(dir.path().join("notes.md"), "progress\n").unwrap();

        let checkpointer = GitCheckpointer::new(dir.path());
        let first = checkpointer.checkpoint("build", "initial pass").unwrap();
        assert_eq!(first, CheckpointOutcome::Committed);

        let second = checkpointer.checkpoint("build", "no changes").unwrap();
        assert_eq!(second, CheckpointOutcome::NothingToCommit);

        let log = run(&["log", "--oneline"]);
        assert!(log.stdout.contains("[build] initial pass"));
    }
}
