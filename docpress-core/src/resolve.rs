//! Source resolution: expands a job's glob pattern into concrete files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::JobError;

/// Resolves `pattern` against the process working directory.
pub fn resolve(pattern: &str) -> Result<Vec<PathBuf>, JobError> {
    resolve_in(Path::new("."), pattern)
}

/// Resolves `pattern` against `root`.
///
/// `*` and `?` never cross a path separator; `**` matches any number of
/// directories. Only regular files, or links to them, are returned. When `root` is `.` the
/// returned paths are relative to the working directory, otherwise they are
/// `root` joined with the matched relative path.
pub fn resolve_in(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, JobError> {
    let normalized = pattern.trim_start_matches("./");
    let matcher = GlobBuilder::new(normalized)
        .literal_separator(true)
        .build()
        .map_err(|source| JobError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    let walk_root = root.join(literal_base(normalized));
    if !walk_root.exists() {
        debug!(root = %walk_root.display(), pattern, "Pattern base does not exist");
        return Err(JobError::NoMatch {
            pattern: pattern.to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut matches = Vec::new();
    for entry in WalkDir::new(&walk_root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, pattern, "Skipping unreadable entry while resolving");
                continue;
            }
        };
        // Follows links, so a symlinked file counts as the file it names.
        if !entry.path().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if !matcher.is_match(relative) {
            continue;
        }
        let path = if root == Path::new(".") {
            relative.to_path_buf()
        } else {
            root.join(relative)
        };
        if seen.insert(path.clone()) {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(JobError::NoMatch {
            pattern: pattern.to_string(),
        });
    }
    debug!(pattern, count = matches.len(), "Resolved pattern");
    Ok(matches)
}

/// Leading directory components of `pattern` that contain no glob syntax.
fn literal_base(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').collect();
    let mut base = PathBuf::new();
    // The last segment names files, so it never narrows the walk.
    for segment in &segments[..segments.len().saturating_sub(1)] {
        if segment.is_empty() || segment.contains(['*', '?', '[', ']', '{', '}', '\\']) {
            break;
        }
        base.push(segment);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_base_stops_at_first_wildcard() {
        assert_eq!(literal_base("docs/guides/**/README.md"), PathBuf::from("docs/guides"));
        assert_eq!(literal_base("**/README.md"), PathBuf::new());
        assert_eq!(literal_base("README.md"), PathBuf::new());
        assert_eq!(literal_base("a/{b,c}/x.md"), PathBuf::from("a"));
    }
}
