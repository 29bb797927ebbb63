//! # contract: collaborator interfaces and the data handed between stages
//!
//! The pipeline talks to three external collaborators through the traits in
//! this module, so that the binary can wire real implementations while tests
//! substitute deterministic ones:
//!
//! - [`MarkdownConverter`]: markdown bytes to an HTML fragment.
//! - [`Renderer`]: complete HTML document to a paginated binary artifact.
//! - [`Archiver`]: directory to a compressed archive.
//!
//! ## Mocking & Testing
//! - `Renderer` and `Archiver` are annotated for `mockall`; the generated
//!   `MockRenderer` / `MockArchiver` are exported under the default
//!   `test-export-mocks` feature so integration tests can use them.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::{ArchiveError, MarkdownError, RenderError};

/// Combined text for one rendering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalDocument {
    /// Display name, also the default title when the document is wrapped.
    pub name: String,
    pub content: String,
    /// Directory relative image references are resolved against.
    pub base_dir: PathBuf,
    /// Whether `content` is markdown (as opposed to HTML).
    pub is_markdown: bool,
}

/// A published artifact, plus its companion archive when one was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub path: PathBuf,
    pub companion: Option<PathBuf>,
}

/// Converts markdown into an HTML fragment.
pub trait MarkdownConverter: Send + Sync {
    fn to_html(&self, markdown: &str) -> Result<String, MarkdownError>;
}

/// Turns a complete HTML document into a binary artifact at `output`.
///
/// Implementations must either leave `output` untouched or replace it whole.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, html: &str, output: &Path) -> Result<(), RenderError>;
}

/// Archives every file below `source_dir` into `destination`, overwriting it.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Archiver: Send + Sync {
    fn archive_dir(&self, source_dir: &Path, destination: &Path) -> Result<(), ArchiveError>;
}
