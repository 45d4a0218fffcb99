//! Derived-asset generation: StatusDocument → embeddable JS.
//!
//! The asset is a pure function of the document: an object literal plus a
//! fixed set of read-only accessors for the static dashboard page. Outputs
//! are replaced atomically and skipped when the rendered content is
//! byte-identical to what is already on disk.

use std::path::{Path, PathBuf};

use anyhow::Context;
use minijinja::{context, Environment};
use sha2::{Digest, Sha256};

use crate::fsutil::write_atomic;
use crate::store::{StatusDocument, StatusStore};

const STATUS_JS_TEMPLATE: &str = include_str!("templates/status.js.jinja");

#[derive(Debug, Default)]
pub struct CompileReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Compile the current document into every configured output path.
///
/// Reading is tolerant (a missing document seeds the default); each output
/// write is all-or-nothing.
pub fn compile(
    store: &StatusStore,
    outputs: &[PathBuf],
) -> anyhow::Result<(StatusDocument, CompileReport)> {
    let doc = store.read()?;
    let rendered = render_status_js(&doc, store.path())?;
    let rendered_hash = sha256_hex(rendered.as_bytes());

    let mut report = CompileReport::default();
    for output in outputs {
        let unchanged = std::fs::read(output)
            .is_ok_and(|existing| sha256_hex(&existing) == rendered_hash);
        if unchanged {
            tracing::debug!(path = %output.display(), "status asset unchanged, skipping");
            report.skipped.push(output.clone());
            continue;
        }
        write_atomic(output, &rendered)
            .with_context(|| format!("generating {}", output.display()))?;
        report.written.push(output.clone());
    }

    Ok((doc, report))
}

/// Render the JS asset for a document.
pub fn render_status_js(doc: &StatusDocument, source_path: &Path) -> anyhow::Result<String> {
    let status_json =
        serde_json::to_string_pretty(doc).context("serializing status document for asset")?;
    let mut env = Environment::new();
    env.add_template("status.js", STATUS_JS_TEMPLATE)
        .context("loading status asset template")?;
    let template = env.get_template("status.js")?;
    template
        .render(context! {
            status_json => status_json,
            source_path => source_path.display().to_string(),
        })
        .context("rendering status asset")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
