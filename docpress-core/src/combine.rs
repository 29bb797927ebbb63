//! Content combination: turns a resolved match set into logical documents.
//!
//! Three strategies exist, one per [`JobKind`](crate::config::JobKind):
//! - [`independent`]: one document per marker file, named after its folder.
//! - [`merge`]: every match concatenated into one document.
//! - [`merge_with_headers`]: marker files only, each under a heading naming
//!   its folder.
//!
//! Matches are always consumed in resolver order.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::contract::LogicalDocument;
use crate::error::JobError;

/// File name that identifies a folder's primary document.
pub const MARKER_FILENAME: &str = "README.md";

/// Delimiter between files in a plain merge.
pub const MERGE_SEPARATOR: &str = "\n\n";

/// Delimiter between folder sections in a merge-with-headers document.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// A marker file picked up by the independent strategy.
#[derive(Debug)]
pub struct MarkerDocument {
    /// Folder holding the marker file.
    pub folder: PathBuf,
    /// Name of that folder; the artifact is named after it.
    pub folder_name: String,
    /// The document, or the read failure that aborted it.
    pub document: Result<LogicalDocument, JobError>,
}

pub fn is_marker(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == MARKER_FILENAME)
}

/// Parent directory of `path`, with `.` standing in for a bare file name.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Name of the folder containing `path`.
///
/// Falls back to the canonical directory name when the parent is `.` or
/// `..`, and to `root` when even that has no name.
pub fn folder_name(path: &Path) -> String {
    let parent = parent_dir(path);
    let named = parent
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            fs::canonicalize(&parent)
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        });
    named.unwrap_or_else(|| "root".to_string())
}

pub fn independent(matches: &[PathBuf]) -> Vec<MarkerDocument> {
    matches
        .iter()
        .filter(|m| is_marker(m))
        .map(|marker| {
            let folder = parent_dir(marker);
            let folder_name = folder_name(marker);
            let document = read_source(marker).map(|content| LogicalDocument {
                name: folder_name.clone(),
                content,
                base_dir: folder.clone(),
                is_markdown: true,
            });
            MarkerDocument {
                folder,
                folder_name,
                document,
            }
        })
        .collect()
}

/// Concatenates every readable match; unreadable ones are skipped.
///
/// The base directory is the first match's folder, even when that file
/// itself could not be read.
pub fn merge(pattern: &str, matches: &[PathBuf], name: &str) -> Result<LogicalDocument, JobError> {
    let first = matches.first().ok_or_else(|| JobError::NoMatch {
        pattern: pattern.to_string(),
    })?;

    let parts: Vec<String> = matches
        .iter()
        .filter_map(|m| read_or_skip(m))
        .collect();
    if parts.is_empty() {
        return Err(JobError::NothingReadable {
            pattern: pattern.to_string(),
            count: matches.len(),
        });
    }

    Ok(LogicalDocument {
        name: name.to_string(),
        content: parts.join(MERGE_SEPARATOR),
        base_dir: parent_dir(first),
        is_markdown: true,
    })
}

pub fn merge_with_headers(
    pattern: &str,
    matches: &[PathBuf],
    name: &str,
) -> Result<LogicalDocument, JobError> {
    let markers: Vec<&PathBuf> = matches.iter().filter(|m| is_marker(m)).collect();
    let Some(first) = markers.first() else {
        return Err(JobError::NoMarkerFiles {
            pattern: pattern.to_string(),
            marker: MARKER_FILENAME.to_string(),
        });
    };
    debug!(
        pattern,
        markers = markers.len(),
        ignored = matches.len() - markers.len(),
        "Selected marker files"
    );

    let sections: Vec<String> = markers
        .iter()
        .filter_map(|m| {
            let content = read_or_skip(m)?;
            Some(format!("# {}\n\n{}", folder_name(m), content))
        })
        .collect();
    if sections.is_empty() {
        return Err(JobError::NothingReadable {
            pattern: pattern.to_string(),
            count: markers.len(),
        });
    }

    Ok(LogicalDocument {
        name: name.to_string(),
        content: sections.join(SECTION_SEPARATOR),
        base_dir: parent_dir(first),
        is_markdown: true,
    })
}

pub(crate) fn read_source(path: &Path) -> Result<String, JobError> {
    let bytes = fs::read(path).map_err(|source| JobError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_or_skip(path: &Path) -> Option<String> {
    match read_source(path) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping unreadable file");
            None
        }
    }
}
