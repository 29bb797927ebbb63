//! Error types shared by the pipeline stages.
//!
//! Job-level errors fail only the job (or document) that raised them; the
//! pipeline records them in its report and moves on to the next job.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("no files match pattern '{pattern}'")]
    NoMatch { pattern: String },

    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("no {marker} files found for pattern '{pattern}'")]
    NoMarkerFiles { pattern: String, marker: String },

    #[error("none of the {count} matched files for '{pattern}' could be read")]
    NothingReadable { pattern: String, count: usize },

    #[error("unknown job type '{kind}' for source '{source_pattern}'")]
    UnknownJobType {
        kind: String,
        source_pattern: String,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("entry name '{0}' is not a plain file name")]
    InvalidEntryName(String),

    #[error("markdown conversion failed: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct MarkdownError(pub String);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no headless browser found (set CHROME_BIN or install chromium)")]
    BrowserNotFound,

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("renderer did not finish within {0:?}")]
    Timeout(Duration),

    #[error("renderer exited with {status}: {stderr}")]
    Exit { status: ExitStatus, stderr: String },

    #[error("renderer reported success but wrote no output to {0}")]
    MissingOutput(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to scan {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("catalog template error: {0}")]
    Template(#[from] minijinja::Error),
}

#[derive(Debug, Error)]
pub enum HydrateError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },

    #[error("failed to parse JSON data {path}: {source}")]
    Data {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON data {0} must be an object mapping entry names to values")]
    NotAnObject(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
