//! Dashboard indexing: scans an output tree and groups what it finds.
//!
//! The scan makes two passes. The first pairs every `<base>_src.zip` with a
//! `<base>.pdf` in the same directory, when one exists. The second lists
//! every file except paired archives, grouped by containing folder. Sections
//! are ordered by folder and entries by file name, so an unchanged tree
//! always yields the same catalog.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::addressing::slash_path;
use crate::archive::COMPANION_SUFFIX;
use crate::error::CatalogError;
use crate::pipeline::ARTIFACT_EXTENSION;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// File name.
    pub name: String,
    /// Path relative to the scan root.
    pub path: PathBuf,
    /// Paired companion archive, relative to the scan root.
    pub companion: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Containing directory as walked, `/`-separated.
    pub folder: String,
    pub entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub root: PathBuf,
    pub sections: Vec<Section>,
}

impl Catalog {
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }
}

/// Base name of a companion archive: `demo` for `demo_src.zip`.
pub fn companion_base(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(COMPANION_SUFFIX)
        .filter(|base| !base.is_empty())
}

fn is_primary(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION)
}

/// Scans `root`, skipping any file in `exclude`.
pub fn scan(root: &Path, exclude: &[PathBuf]) -> Result<Catalog, CatalogError> {
    let excluded: HashSet<PathBuf> = exclude.iter().filter_map(|p| p.canonicalize().ok()).collect();
    let files = walk_files(root)?;

    // Pass 1: primary artifact -> companion archive.
    let mut pairs: HashMap<PathBuf, PathBuf> = HashMap::new();
    for (path, rel) in &files {
        let Some(base) = path.file_name().and_then(|n| n.to_str()).and_then(companion_base) else {
            continue;
        };
        let primary = path.with_file_name(format!("{base}.{ARTIFACT_EXTENSION}"));
        if primary.is_file() {
            debug!(archive = %rel.display(), primary = %primary.display(), "Paired companion archive");
            pairs.insert(primary, rel.clone());
        }
    }
    let paired: HashSet<&PathBuf> = pairs.values().collect();

    // Pass 2: listing.
    let mut grouped: BTreeMap<String, Vec<CatalogEntry>> = BTreeMap::new();
    for (path, rel) in &files {
        if paired.contains(rel) {
            continue;
        }
        if !excluded.is_empty() && path.canonicalize().is_ok_and(|c| excluded.contains(&c)) {
            debug!(path = %path.display(), "Skipping catalog output");
            continue;
        }
        let folder = folder_label(path);
        let companion = if is_primary(path) {
            pairs.get(path).cloned()
        } else {
            None
        };
        grouped.entry(folder).or_default().push(CatalogEntry {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: rel.clone(),
            companion,
        });
    }

    let sections: Vec<Section> = grouped
        .into_iter()
        .map(|(folder, mut entries)| {
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            Section { folder, entries }
        })
        .collect();

    let catalog = Catalog {
        root: root.to_path_buf(),
        sections,
    };
    info!(
        root = %root.display(),
        sections = catalog.sections.len(),
        entries = catalog.entry_count(),
        "Scanned output tree"
    );
    Ok(catalog)
}

/// Section heading for `path`'s directory; `.` when that renders empty.
fn folder_label(path: &Path) -> String {
    let folder = path.parent().map(slash_path).unwrap_or_default();
    if folder.is_empty() {
        ".".to_string()
    } else {
        folder
    }
}

/// Every regular file (or link to one) below `root` as `(walked path, path relative to root)`.
fn walk_files(root: &Path) -> Result<Vec<(PathBuf, PathBuf)>, CatalogError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| CatalogError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.path().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| entry.path().to_path_buf());
        files.push((entry.path().to_path_buf(), rel));
    }
    Ok(files)
}
