//! Catalog encodings: a hyperlinked HTML page and a markdown table.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use minijinja::{context, Environment};
use serde::Serialize;
use tracing::info;

use crate::addressing::{Addressing, RemoteRepo};
use crate::catalog::{scan, Catalog};
use crate::error::CatalogError;

pub const CATALOG_TITLE: &str = "Files Dashboard";
pub const DEFAULT_SOURCE: &str = "output";
pub const DEFAULT_OUTPUT: &str = "output/files-dashboard.html";

const HTML_TEMPLATE: &str = "catalog.html";
const MARKDOWN_TEMPLATE: &str = "catalog.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogFormat {
    Html,
    Markdown,
    #[default]
    Both,
}

impl CatalogFormat {
    pub fn wants_html(self) -> bool {
        matches!(self, CatalogFormat::Html | CatalogFormat::Both)
    }

    pub fn wants_markdown(self) -> bool {
        matches!(self, CatalogFormat::Markdown | CatalogFormat::Both)
    }
}

impl FromStr for CatalogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(CatalogFormat::Html),
            "markdown" | "md" => Ok(CatalogFormat::Markdown),
            "both" => Ok(CatalogFormat::Both),
            other => Err(format!("unknown catalog format '{other}' (expected html, markdown or both)")),
        }
    }
}

impl fmt::Display for CatalogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CatalogFormat::Html => "html",
            CatalogFormat::Markdown => "markdown",
            CatalogFormat::Both => "both",
        })
    }
}

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Directory to scan.
    pub source: PathBuf,
    /// Catalog path; its extension is swapped per encoding.
    pub output: PathBuf,
    pub format: CatalogFormat,
    /// Remote used to address markdown entries, when known.
    pub remote: Option<RemoteRepo>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE),
            output: PathBuf::from(DEFAULT_OUTPUT),
            format: CatalogFormat::Both,
            remote: None,
        }
    }
}

impl CatalogOptions {
    pub fn html_path(&self) -> Option<PathBuf> {
        self.format
            .wants_html()
            .then(|| with_extension(&self.output, "html"))
    }

    pub fn markdown_path(&self) -> Option<PathBuf> {
        self.format
            .wants_markdown()
            .then(|| with_extension(&self.output, "md"))
    }
}

#[derive(Debug, Default)]
pub struct CatalogReport {
    pub written: Vec<PathBuf>,
    pub sections: usize,
    pub entries: usize,
}

fn with_extension(path: &Path, ext: &str) -> PathBuf {
    if path.extension().is_some_and(|e| e == ext) {
        path.to_path_buf()
    } else {
        path.with_extension(ext)
    }
}

#[derive(Debug, Serialize)]
struct Row {
    name: String,
    href: String,
    companion: Option<String>,
}

#[derive(Debug, Serialize)]
struct SectionView {
    folder: String,
    rows: Vec<Row>,
}

fn views(catalog: &Catalog, addressing: &Addressing, cell: fn(&str) -> String) -> Vec<SectionView> {
    catalog
        .sections
        .iter()
        .map(|section| SectionView {
            folder: section.folder.clone(),
            rows: section
                .entries
                .iter()
                .map(|entry| Row {
                    name: cell(&entry.name),
                    href: addressing.address(&catalog.root, &entry.path),
                    companion: entry
                        .companion
                        .as_ref()
                        .map(|zip| addressing.address(&catalog.root, zip)),
                })
                .collect(),
        })
        .collect()
}

fn markdown_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Renders catalogs from a finished scan.
pub struct CatalogWriter {
    env: Environment<'static>,
}

impl CatalogWriter {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(HTML_TEMPLATE, include_str!("../templates/catalog.html"))?;
        env.add_template(MARKDOWN_TEMPLATE, include_str!("../templates/catalog.md"))?;
        Ok(Self { env })
    }

    /// HTML catalog; links are relative to `catalog_file`'s directory.
    pub fn html(&self, catalog: &Catalog, catalog_file: &Path) -> Result<String, minijinja::Error> {
        let addressing = Addressing::relative(catalog_file);
        let sections = views(catalog, &addressing, |s| s.to_string());
        self.env
            .get_template(HTML_TEMPLATE)?
            .render(context! { title => CATALOG_TITLE, sections => sections })
    }

    /// Markdown catalog; links point at `remote` when given, otherwise they
    /// are relative to `catalog_file`'s directory.
    pub fn markdown(
        &self,
        catalog: &Catalog,
        catalog_file: &Path,
        remote: Option<&RemoteRepo>,
    ) -> Result<String, minijinja::Error> {
        let addressing = match remote {
            Some(repo) => Addressing::remote(repo, &catalog.root),
            None => Addressing::relative(catalog_file),
        };
        let sections = views(catalog, &addressing, markdown_cell);
        self.env
            .get_template(MARKDOWN_TEMPLATE)?
            .render(context! { title => CATALOG_TITLE, sections => sections })
    }
}

/// Scans `options.source` and writes the requested encodings.
pub fn generate_catalog(options: &CatalogOptions) -> Result<CatalogReport, CatalogError> {
    let html_path = options.html_path();
    let markdown_path = options.markdown_path();
    let targets: Vec<PathBuf> = html_path.iter().chain(markdown_path.iter()).cloned().collect();

    let catalog = scan(&options.source, &targets)?;
    let writer = CatalogWriter::new()?;
    let mut report = CatalogReport {
        written: Vec::new(),
        sections: catalog.sections.len(),
        entries: catalog.entry_count(),
    };

    if let Some(path) = html_path {
        let html = writer.html(&catalog, &path)?;
        write_whole(&path, &html)?;
        info!(output = %path.display(), "HTML catalog written");
        report.written.push(path);
    }
    if let Some(path) = markdown_path {
        let markdown = writer.markdown(&catalog, &path, options.remote.as_ref())?;
        write_whole(&path, &markdown)?;
        info!(
            output = %path.display(),
            remote = options.remote.is_some(),
            "Markdown catalog written"
        );
        report.written.push(path);
    }
    Ok(report)
}

/// Replaces `path` with `contents` through a temporary sibling file.
fn write_whole(path: &Path, contents: &str) -> Result<(), CatalogError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path).map_err(|e| CatalogError::Io(e.error))?;
    Ok(())
}
