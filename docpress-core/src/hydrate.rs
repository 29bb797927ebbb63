//! Template hydration: one document per entry of a JSON data map.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{context, Environment};
use serde_json::Value;
use tracing::{error, info};

use crate::contract::{LogicalDocument, RenderedArtifact};
use crate::error::{HydrateError, JobError};
use crate::pipeline::{DocumentFailure, Pipeline, ARTIFACT_EXTENSION};
use crate::template::document_title;

#[derive(Debug, Clone)]
pub struct HydrateRequest {
    /// `.html` or `.md` template; Jinja syntax.
    pub template_path: PathBuf,
    /// JSON object mapping entry names to their data.
    pub data_path: PathBuf,
    pub output_dir: PathBuf,
    /// Base for image references; the template's directory when `None`.
    pub images_dir: Option<PathBuf>,
}

impl HydrateRequest {
    pub fn is_markdown(&self) -> bool {
        self.template_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
    }

    pub fn images_base(&self) -> PathBuf {
        match &self.images_dir {
            Some(dir) => dir.clone(),
            None => match self.template_path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct HydrateReport {
    pub artifacts: Vec<RenderedArtifact>,
    pub failures: Vec<DocumentFailure>,
}

/// Renders every entry of the data map through the template and publishes
/// `<output_dir>/<name>.pdf` for each.
///
/// Loading problems (template, data, output directory) are fatal. A failing
/// entry is logged and recorded, and the remaining entries still run.
pub async fn hydrate(
    pipeline: &Pipeline<'_>,
    request: &HydrateRequest,
) -> Result<HydrateReport, HydrateError> {
    let source = read(&request.template_path)?;
    let data = load_data(&request.data_path)?;

    // The name's extension picks auto-escaping: on for .html, off for .md.
    let template_name = request
        .template_path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_else(|| "template.html".to_string());
    let env = Environment::new();
    let template = env
        .template_from_named_str(&template_name, &source)
        .map_err(|source| HydrateError::Template {
            path: request.template_path.clone(),
            source,
        })?;

    fs::create_dir_all(&request.output_dir)?;
    let is_markdown = request.is_markdown();
    let base_dir = request.images_base();
    let mut report = HydrateReport::default();

    for (name, value) in &data {
        let output = request
            .output_dir
            .join(format!("{name}.{ARTIFACT_EXTENSION}"));
        let rendered = match check_entry_name(name).and_then(|()| render_entry(&template, value)) {
            Ok(content) => {
                let doc = LogicalDocument {
                    name: name.clone(),
                    content,
                    base_dir: base_dir.clone(),
                    is_markdown,
                };
                let title = document_title(name, Some(value));
                pipeline.render_titled(&doc, &title, &output).await
            }
            Err(e) => Err(e),
        };
        match rendered {
            Ok(artifact) => {
                info!(entry = %name, output = %artifact.path.display(), "Rendered entry");
                report.artifacts.push(artifact);
            }
            Err(e) => {
                error!(entry = %name, error = %e, "Failed to render entry");
                report.failures.push(DocumentFailure {
                    name: name.clone(),
                    error: e,
                });
            }
        }
    }
    Ok(report)
}

/// Entry names become file names inside the output directory, so they may
/// not name a directory or climb out of it.
fn check_entry_name(name: &str) -> Result<(), JobError> {
    let invalid = name.trim().is_empty()
        || name.contains(['/', '\\'])
        || name.split('.').all(str::is_empty)
        || name.contains("..");
    if invalid {
        return Err(JobError::InvalidEntryName(name.to_string()));
    }
    Ok(())
}

fn render_entry(template: &minijinja::Template<'_, '_>, value: &Value) -> Result<String, JobError> {
    let rendered = if value.is_object() {
        template.render(value)?
    } else {
        template.render(context! { value => value })?
    };
    Ok(rendered)
}

fn read(path: &Path) -> Result<String, HydrateError> {
    fs::read_to_string(path).map_err(|source| HydrateError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Entries come back sorted by name.
fn load_data(path: &Path) -> Result<serde_json::Map<String, Value>, HydrateError> {
    let text = read(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|source| HydrateError::Data {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(HydrateError::NotAnObject(path.to_path_buf())),
    }
}
