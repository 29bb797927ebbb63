//! Job pipeline: resolve → combine → embed → wrap → publish.
//!
//! Jobs run one after another in configuration order, and matches within a
//! job in resolver order. A failing job (or a failing document within an
//! independent job) is logged and recorded in the [`RunReport`]; it never
//! stops the jobs that follow.
//!
//! # Major Types
//! - [`Pipeline`]: the collaborators a run needs, constructed once by the caller.
//! - [`RunReport`] / [`JobReport`]: what was written and what failed.
//!
//! # Navigation
//! - Entrypoints: [`Pipeline::run_jobs`], [`Pipeline::run_job`].

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::combine::{self, MarkerDocument};
use crate::config::{Job, JobEntry, JobKind};
use crate::contract::{LogicalDocument, MarkdownConverter, RenderedArtifact};
use crate::embed::embed_images;
use crate::error::JobError;
use crate::publish::Publisher;
use crate::resolve::resolve_in;
use crate::template::{needs_wrap, DocumentShell};

/// Extension of every rendered artifact.
pub const ARTIFACT_EXTENSION: &str = "pdf";

/// A document that failed inside an otherwise running job.
#[derive(Debug)]
pub struct DocumentFailure {
    pub name: String,
    pub error: JobError,
}

#[derive(Debug)]
pub struct JobReport {
    pub source: String,
    /// `None` when the configured type was not recognised.
    pub kind: Option<JobKind>,
    pub outcome: Result<Vec<RenderedArtifact>, JobError>,
    pub failures: Vec<DocumentFailure>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok() && self.failures.is_empty()
    }

    pub fn artifacts(&self) -> &[RenderedArtifact] {
        self.outcome.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub jobs: Vec<JobReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.jobs.iter().filter(|j| j.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.jobs.len() - self.succeeded()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &RenderedArtifact> {
        self.jobs.iter().flat_map(|j| j.artifacts())
    }
}

pub struct Pipeline<'a> {
    root: PathBuf,
    converter: &'a dyn MarkdownConverter,
    shell: &'a DocumentShell,
    publisher: Publisher<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        converter: &'a dyn MarkdownConverter,
        shell: &'a DocumentShell,
        publisher: Publisher<'a>,
    ) -> Self {
        Self {
            root: PathBuf::from("."),
            converter,
            shell,
            publisher,
        }
    }

    /// Resolves patterns against `root` instead of the working directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Runs every configured entry in order.
    pub async fn run_jobs(&self, entries: &[JobEntry]) -> RunReport {
        info!(jobs = entries.len(), "Starting render run");
        let mut report = RunReport::default();

        for entry in entries {
            let job_report = match entry.clone().into_job() {
                Ok(job) => self.run_job(&job).await,
                Err(e) => {
                    warn!(source = %entry.source, kind = %entry.kind, "Skipping job with unknown type");
                    JobReport {
                        source: entry.source.clone(),
                        kind: None,
                        outcome: Err(e),
                        failures: Vec::new(),
                    }
                }
            };
            report.jobs.push(job_report);
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Render run finished"
        );
        report
    }

    pub async fn run_job(&self, job: &Job) -> JobReport {
        job.trace_loaded();
        let mut failures = Vec::new();
        let outcome = match job.kind {
            JobKind::Independent => self.run_independent(job, &mut failures).await,
            JobKind::Merge | JobKind::MergeWithHeaders => {
                self.run_merge(job).await.map(|artifact| vec![artifact])
            }
        };

        match &outcome {
            Ok(artifacts) => info!(
                source = %job.source,
                kind = %job.kind,
                artifacts = artifacts.len(),
                failures = failures.len(),
                "Job finished"
            ),
            Err(e) => error!(source = %job.source, kind = %job.kind, error = %e, "Job failed"),
        }

        JobReport {
            source: job.source.clone(),
            kind: Some(job.kind),
            outcome,
            failures,
        }
    }

    async fn run_independent(
        &self,
        job: &Job,
        failures: &mut Vec<DocumentFailure>,
    ) -> Result<Vec<RenderedArtifact>, JobError> {
        let matches = resolve_in(&self.root, &job.source)?;
        let markers = combine::independent(&matches);
        if markers.is_empty() {
            warn!(
                source = %job.source,
                marker = combine::MARKER_FILENAME,
                "No marker files among matches, nothing to render"
            );
            return Ok(Vec::new());
        }

        std::fs::create_dir_all(&job.output)?;
        let mut artifacts = Vec::new();
        for MarkerDocument {
            folder,
            folder_name,
            document,
        } in markers
        {
            let output = job
                .output
                .join(format!("{folder_name}.{ARTIFACT_EXTENSION}"));
            let rendered = match document {
                Ok(doc) => self.render_document(&doc, &output).await,
                Err(e) => Err(e),
            };
            match rendered {
                Ok(mut artifact) => {
                    self.publisher
                        .attach_companion(&mut artifact, &folder, &job.output, &folder_name);
                    artifacts.push(artifact);
                }
                Err(e) => {
                    error!(folder = %folder.display(), error = %e, "Document failed");
                    failures.push(DocumentFailure {
                        name: folder_name,
                        error: e,
                    });
                }
            }
        }
        Ok(artifacts)
    }

    async fn run_merge(&self, job: &Job) -> Result<RenderedArtifact, JobError> {
        let matches = resolve_in(&self.root, &job.source)?;
        debug!(source = %job.source, matches = matches.len(), "Resolved matches");
        let name = output_stem(&job.output);
        let doc = match job.kind {
            JobKind::MergeWithHeaders => combine::merge_with_headers(&job.source, &matches, &name)?,
            _ => combine::merge(&job.source, &matches, &name)?,
        };
        self.render_document(&doc, &job.output).await
    }

    /// Converts, embeds, wraps (when needed) and publishes one document.
    pub(crate) async fn render_document(
        &self,
        doc: &LogicalDocument,
        output: &Path,
    ) -> Result<RenderedArtifact, JobError> {
        self.render_titled(doc, &doc.name, output).await
    }

    pub(crate) async fn render_titled(
        &self,
        doc: &LogicalDocument,
        title: &str,
        output: &Path,
    ) -> Result<RenderedArtifact, JobError> {
        let html = if doc.is_markdown {
            self.converter.to_html(&doc.content)?
        } else {
            doc.content.clone()
        };
        let embedded = embed_images(&html, &doc.base_dir);
        let full = if needs_wrap(&embedded, doc.is_markdown) {
            self.shell.wrap(&embedded, title)?
        } else {
            embedded
        };
        Ok(self.publisher.publish(&full, output).await?)
    }
}

fn output_stem(output: &Path) -> String {
    output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}
