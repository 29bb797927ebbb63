//! Wrapping decision and the shared presentational shell.

use minijinja::{context, Environment};
use serde_json::Value;

const SHELL_NAME: &str = "shell.html";
const SHELL_SOURCE: &str = include_str!("../templates/shell.html");

/// Lowercase tag openers, any one of which shows a document brings its own
/// shell.
const DOCUMENT_MARKERS: &[&str] = &["<!doctype", "<html", "<head", "<style"];

/// Whether `content` has to be placed inside the shared shell.
///
/// Markdown-sourced content always does. HTML content does only when it
/// carries none of the document-level markers.
pub fn needs_wrap(content: &str, is_markdown: bool) -> bool {
    is_markdown || !is_complete_document(content)
}

pub fn is_complete_document(content: &str) -> bool {
    let lower = content.to_ascii_lowercase();
    DOCUMENT_MARKERS
        .iter()
        .any(|marker| find_tag(&lower, marker).is_some())
}

/// Byte offset of the first `opener` in `lower` that ends at a tag boundary,
/// so `<head` matches `<head>` and `<head lang="en">` but not `<header>`.
/// `lower` must already be ASCII-lowercased.
pub(crate) fn find_tag(lower: &str, opener: &str) -> Option<usize> {
    lower.match_indices(opener).map(|(i, _)| i).find(|&i| {
        lower[i + opener.len()..]
            .chars()
            .next()
            .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace())
    })
}

/// Byte offset just past the `>` closing the first `opener` tag.
pub(crate) fn tag_end(lower: &str, opener: &str) -> Option<usize> {
    let start = find_tag(lower, opener)?;
    lower[start..].find('>').map(|end| start + end + 1)
}

/// Title for a wrapped document: a string `Title` field of `data` wins over
/// `default`.
pub fn document_title(default: &str, data: Option<&Value>) -> String {
    data.and_then(|d| d.get("Title"))
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// The shared HTML shell (typography, code blocks, tables).
///
/// Built once by the caller and passed to whoever wraps documents.
pub struct DocumentShell {
    env: Environment<'static>,
}

impl DocumentShell {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(SHELL_NAME, SHELL_SOURCE)?;
        Ok(Self { env })
    }

    /// Substitutes `content` (unescaped) and `title` (escaped) into the shell.
    pub fn wrap(&self, content: &str, title: &str) -> Result<String, minijinja::Error> {
        self.env
            .get_template(SHELL_NAME)?
            .render(context! { title => title, content => content })
    }
}
