use std::fs;
use std::path::{Path, PathBuf};

use docpress_core::combine::{independent, merge, merge_with_headers, MERGE_SEPARATOR, SECTION_SEPARATOR};
use docpress_core::error::JobError;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn independent_names_documents_after_their_folder() {
    let dir = tempdir().unwrap();
    let matches = vec![
        write(dir.path(), "guides/install/README.md", "install"),
        write(dir.path(), "guides/install/extra.md", "ignored"),
        write(dir.path(), "guides/usage/README.md", "usage"),
    ];

    let docs = independent(&matches);
    let names: Vec<&str> = docs.iter().map(|d| d.folder_name.as_str()).collect();
    assert_eq!(names, vec!["install", "usage"]);

    let usage = docs[1].document.as_ref().unwrap();
    assert_eq!(usage.name, "usage");
    assert_eq!(usage.content, "usage");
    assert_eq!(usage.base_dir, dir.path().join("guides/usage"));
    assert!(usage.is_markdown);
}

#[test]
fn independent_read_failure_only_affects_that_marker() {
    let dir = tempdir().unwrap();
    let matches = vec![
        dir.path().join("gone/README.md"),
        write(dir.path(), "kept/README.md", "kept"),
    ];

    let docs = independent(&matches);
    assert_eq!(docs.len(), 2);
    assert!(matches!(docs[0].document, Err(JobError::Read { .. })));
    assert_eq!(docs[1].document.as_ref().unwrap().content, "kept");
}

#[test]
fn merge_joins_in_order_and_skips_unreadable_files() {
    let dir = tempdir().unwrap();
    let matches = vec![
        write(dir.path(), "book/01.md", "# One"),
        dir.path().join("book/02.md"),
        write(dir.path(), "book/extra/03.md", "# Three"),
    ];

    let doc = merge("book/**/*.md", &matches, "book").unwrap();
    assert_eq!(doc.content, format!("# One{MERGE_SEPARATOR}# Three"));
    assert_eq!(doc.base_dir, dir.path().join("book"));
    assert_eq!(doc.name, "book");
}

#[test]
fn merge_with_nothing_readable_fails() {
    let dir = tempdir().unwrap();
    let matches = vec![dir.path().join("a.md"), dir.path().join("b.md")];
    let err = merge("*.md", &matches, "out").unwrap_err();
    assert!(matches!(err, JobError::NothingReadable { count: 2, .. }), "{err:?}");
}

#[test]
fn merge_with_headers_prefixes_each_folder() {
    let dir = tempdir().unwrap();
    let matches = vec![
        write(dir.path(), "A/README.md", "alpha"),
        write(dir.path(), "A/other.md", "not included"),
        write(dir.path(), "B/README.md", "beta"),
    ];

    let doc = merge_with_headers("*/*.md", &matches, "combined").unwrap();
    assert_eq!(doc.content, format!("# A\n\nalpha{SECTION_SEPARATOR}# B\n\nbeta"));
    assert_eq!(doc.base_dir, dir.path().join("A"));
}

#[test]
fn merge_with_headers_requires_marker_files() {
    let dir = tempdir().unwrap();
    let matches = vec![write(dir.path(), "A/notes.md", "x")];
    let err = merge_with_headers("A/*.md", &matches, "combined").unwrap_err();
    assert!(matches!(err, JobError::NoMarkerFiles { .. }), "{err:?}");
}
