use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;

use super::Workspace;

#[derive(Debug, Subcommand)]
pub enum PadCommand {
    /// Print an agent's scratchpad (seeds the template on first access)
    Show {
        /// Agent id
        id: String,
        /// Print raw markdown even on a terminal
        #[arg(long)]
        raw: bool,
        /// Project root directory
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Replace an agent's scratchpad from a file, or stdin when no file is
    /// given
    Write {
        id: String,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Replace one named section, adding it when absent
    Section {
        id: String,
        /// Section title, matched against `## <title>` heading lines
        title: String,
        /// New section body
        #[arg(allow_hyphen_values = true)]
        content: String,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Append a timestamped log line
    Append {
        id: String,
        line: String,
        /// Skip the timestamp prefix
        #[arg(long)]
        no_timestamp: bool,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// List agents with a scratchpad on disk
    List {
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Copy a scratchpad into the archive directory
    Archive {
        id: String,
        /// Archive file name (without extension)
        name: String,
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
}

impl PadCommand {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Self::Show {
                id,
                raw,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                let content = ws.scratchpads().read(id)?;
                if !raw && std::io::stdout().is_terminal() {
                    termimad::print_text(&content);
                } else {
                    print!("{content}");
                }
                Ok(())
            }
            Self::Write {
                id,
                file,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                let content = match file {
                    Some(path) => std::fs::read_to_string(path)?,
                    None => {
                        let mut buf = String::new();
                        std::io::stdin().read_to_string(&mut buf)?;
                        buf
                    }
                };
                ws.scratchpads().write(id, &content)?;
                println!("wrote {id} scratchpad");
                Ok(())
            }
            Self::Section {
                id,
                title,
                content,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                ws.scratchpads().update_section(id, title, content)?;
                println!("updated section {title:?}");
                Ok(())
            }
            Self::Append {
                id,
                line,
                no_timestamp,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                let entry = if *no_timestamp {
                    line.clone()
                } else {
                    format!("- [{}] {line}", Local::now().format("%Y-%m-%d %H:%M"))
                };
                ws.scratchpads().append_line(id, &entry)?;
                Ok(())
            }
            Self::List { project_root } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                for slug in ws.scratchpads().list()? {
                    println!("{slug}");
                }
                Ok(())
            }
            Self::Archive {
                id,
                name,
                project_root,
            } => {
                let ws = Workspace::resolve(project_root.as_deref())?;
                let target = ws.scratchpads().archive(id, name)?;
                println!("archived to {}", target.display());
                Ok(())
            }
        }
    }
}
