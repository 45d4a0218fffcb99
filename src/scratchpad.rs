//! Per-agent markdown notebooks with named-section upsert.
//!
//! Each agent id owns one file under the scratchpad directory. Sections are
//! `## <title>` heading lines; matching is exact-line and case-sensitive,
//! with no markdown parsing beyond heading detection.

use std::path::{Path, PathBuf};

use anyhow::Context;
use minijinja::{context, Environment};

const SCRATCHPAD_TEMPLATE: &str = include_str!("templates/scratchpad.md.jinja");

const FILE_SUFFIX: &str = "_scratchpad.md";

pub struct ScratchpadStore {
    dir: PathBuf,
    project: String,
}

impl ScratchpadStore {
    pub fn new(dir: PathBuf, project: &str) -> Self {
        Self {
            dir,
            project: project.to_string(),
        }
    }

    /// File path for an agent's scratchpad.
    pub fn path_for(&self, agent_id: &str) -> PathBuf {
        self.dir.join(format!("{agent_id}{FILE_SUFFIX}"))
    }

    /// Read an agent's scratchpad, synthesizing and persisting the default
    /// template on first access.
    pub fn read(&self, agent_id: &str) -> anyhow::Result<String> {
        let path = self.ensure_exists(agent_id)?;
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
    }

    /// Replace an agent's scratchpad wholesale.
    pub fn write(&self, agent_id: &str, content: &str) -> anyhow::Result<()> {
        let path = self.path_for(agent_id);
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))
    }

    /// Append a raw line, used for timestamped log entries.
    pub fn append_line(&self, agent_id: &str, line: &str) -> anyhow::Result<()> {
        let path = self.ensure_exists(agent_id)?;
        let mut content =
            std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        content.push_str(line);
        content.push('\n');
        std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))
    }

    /// Replace the body of the named section, or append a new section block
    /// at the end when no heading matches.
    pub fn update_section(
        &self,
        agent_id: &str,
        section_title: &str,
        content: &str,
    ) -> anyhow::Result<()> {
        let current = self.read(agent_id)?;
        let updated = upsert_section(&current, section_title, content);
        self.write(agent_id, &updated)
    }

    /// Agent ids that currently have a scratchpad on disk.
    pub fn list(&self) -> anyhow::Result<Vec<String>> {
        let mut slugs = Vec::new();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(slugs),
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!("listing {}", self.dir.display())))
            }
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(slug) = name.strip_suffix(FILE_SUFFIX) {
                slugs.push(slug.to_string());
            }
        }
        slugs.sort();
        Ok(slugs)
    }

    /// Copy an agent's scratchpad into the archive subdirectory under the
    /// given name. The live scratchpad keeps growing; archiving is the
    /// explicit relief valve.
    pub fn archive(&self, agent_id: &str, archive_name: &str) -> anyhow::Result<PathBuf> {
        let source = self.ensure_exists(agent_id)?;
        let archive_dir = self.dir.join("archive");
        std::fs::create_dir_all(&archive_dir)
            .with_context(|| format!("creating {}", archive_dir.display()))?;
        let target = archive_dir.join(format!("{archive_name}.md"));
        std::fs::copy(&source, &target)
            .with_context(|| format!("archiving {} to {}", source.display(), target.display()))?;
        Ok(target)
    }

    fn ensure_exists(&self, agent_id: &str) -> anyhow::Result<PathBuf> {
        let path = self.path_for(agent_id);
        if !path.exists() {
            let seeded = render_template(agent_id, &self.project)?;
            self.write(agent_id, &seeded)?;
        }
        Ok(path)
    }
}

fn render_template(agent_id: &str, project: &str) -> anyhow::Result<String> {
    let mut env = Environment::new();
    env.add_template("scratchpad.md", SCRATCHPAD_TEMPLATE)
        .context("loading scratchpad template")?;
    let template = env.get_template("scratchpad.md")?;
    let created = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    template
        .render(context! { agent => agent_id, project => project, created => created })
        .context("rendering scratchpad template")
}

/// Replace the body of `## <title>` in `doc`, or append the section when
/// absent. Boundary rules: a section runs from its heading line to the next
/// line starting with `## ` (exclusive) or end of document.
pub fn upsert_section(doc: &str, title: &str, content: &str) -> String {
    let header = format!("## {title}");
    let lines: Vec<&str> = doc.split('\n').collect();

    let Some(start) = lines.iter().position(|line| *line == header) else {
        let mut out = doc.to_string();
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!("\n{header}\n{content}\n"));
        return out;
    };

    let end = lines[start + 1..]
        .iter()
        .position(|line| line.starts_with("## "))
        .map_or(lines.len(), |offset| start + 1 + offset);

    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    out.extend(&lines[..start]);
    out.push(&header);
    out.push(content);
    out.extend(&lines[end..]);
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_SECTIONS: &str = "## A\nalpha\n\n## B\nbeta\n\n## C\ngamma\n";

    fn store(dir: &Path) -> ScratchpadStore {
        ScratchpadStore::new(dir.join("scratchpads"), "demo")
    }

    #[test]
    fn replaces_middle_section_preserving_order() {
        let updated = upsert_section(THREE_SECTIONS, "B", "new text");
        let a = updated.find("## A").unwrap();
        let b = updated.find("## B").unwrap();
        let c = updated.find("## C").unwrap();
        assert!(a < b && b < c);
        assert!(updated.contains("alpha"));
        assert!(updated.contains("new text"));
        assert!(!updated.contains("beta"));
        assert!(updated.contains("gamma"));
    }

    #[test]
    fn replaces_last_section() {
        let updated = upsert_section(THREE_SECTIONS, "C", "tail");
        assert!(updated.contains("## C\ntail"));
        assert!(!updated.contains("gamma"));
        assert!(updated.contains("beta"));
    }

    #[test]
    fn appends_missing_section_after_existing_ones() {
        let updated = upsert_section(THREE_SECTIONS, "D", "delta");
        let c = updated.find("## C").unwrap();
        let d = updated.find("## D").unwrap();
        assert!(c < d);
        assert!(updated.contains("## D\ndelta"));
    }

    #[test]
    fn heading_substring_in_body_does_not_match() {
        let doc = "## A\nsee ## B for details\n\n## C\ngamma\n";
        let updated = upsert_section(doc, "B", "new");
        // No heading "## B" exists, so the section is appended, and the
        // body mention of it is untouched.
        assert!(updated.contains("see ## B for details"));
        assert!(updated.ends_with("## B\nnew\n"));
    }

    #[test]
    fn body_mention_survives_real_section_replace() {
        let doc = "## A\nsee ## B for details\n\n## B\nbeta\n\n## C\ngamma\n";
        let updated = upsert_section(doc, "B", "new");
        assert!(updated.contains("see ## B for details"));
        assert!(updated.contains("## B\nnew"));
        assert!(!updated.contains("beta"));
        assert!(updated.contains("gamma"));
    }

    #[test]
    fn document_without_sections_gets_one_appended() {
        let updated = upsert_section("just prose\n", "Notes", "first note");
        assert!(updated.starts_with("just prose\n"));
        assert!(updated.contains("## Notes\nfirst note"));
    }

    #[test]
    fn first_read_seeds_template() {
        let dir = tempfile::tempdir().unwrap();
        let pads = store(dir.path());
        let content = pads.read("backend").unwrap();
        assert!(content.contains("# backend Scratchpad"));
        assert!(content.contains("- Project: demo"));
        for section in ["Context", "Completed", "In Progress", "Blocked On", "Next Actions", "Notes"]
        {
            assert!(content.contains(&format!("## {section}")), "missing {section}");
        }
        // Persisted, not just synthesized
        assert!(pads.path_for("backend").exists());
    }

    #[test]
    fn append_line_appends() {
        let dir = tempfile::tempdir().unwrap();
        let pads = store(dir.path());
        pads.append_line("backend", "- [ts] did a thing").unwrap();
        let content = pads.read("backend").unwrap();
        assert!(content.ends_with("- [ts] did a thing\n"));
    }

    #[test]
    fn update_section_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let pads = store(dir.path());
        pads.update_section("backend", "In Progress", "- port the API")
            .unwrap();
        let content = pads.read("backend").unwrap();
        assert!(content.contains("## In Progress\n- port the API"));
        // Other sections intact
        assert!(content.contains("## Next Actions"));
    }

    #[test]
    fn list_returns_slugs() {
        let dir = tempfile::tempdir().unwrap();
        let pads = store(dir.path());
        assert!(pads.list().unwrap().is_empty());
        pads.read("backend").unwrap();
        pads.read("api").unwrap();
        assert_eq!(pads.list().unwrap(), vec!["api", "backend"]);
    }

    #[test]
    fn archive_copies_content() {
        let dir = tempfile::tempdir().unwrap();
        let pads = store(dir.path());
        pads.append_line("backend", "history").unwrap();
        let target = pads.archive("backend", "backend-2026-08").unwrap();
        assert!(std::fs::read_to_string(&target).unwrap().contains("history"));
        // Live scratchpad untouched
        assert!(pads.path_for("backend").exists());
    }
}
