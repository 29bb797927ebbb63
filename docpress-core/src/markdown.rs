//! GitHub-flavoured markdown conversion backed by `pulldown-cmark`.

use std::collections::HashMap;

use pulldown_cmark::{html, Event, Options, Parser, Tag};

use crate::contract::MarkdownConverter;
use crate::error::MarkdownError;

/// Default converter: GFM extensions, raw HTML passed through, and
/// generated ids for headings that do not declare one.
#[derive(Debug, Clone)]
pub struct GfmConverter {
    options: Options,
}

impl Default for GfmConverter {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        Self { options }
    }
}

impl GfmConverter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkdownConverter for GfmConverter {
    fn to_html(&self, markdown: &str) -> Result<String, MarkdownError> {
        let mut out = String::with_capacity(markdown.len() * 3 / 2);

        // First pass collects one id per heading lacking an explicit one, the
        // second pass borrows them into the event stream.
        let ids = heading_ids(Parser::new_ext(markdown, self.options));
        let mut next = ids.iter();
        let events = Parser::new_ext(markdown, self.options).map(|event| match event {
            Event::Start(Tag::Heading(level, None, classes)) => {
                let id = next.next().map(String::as_str);
                Event::Start(Tag::Heading(level, id, classes))
            }
            other => other,
        });
        html::push_html(&mut out, events);
        Ok(out)
    }
}

fn heading_ids<'a>(parser: Parser<'a, '_>) -> Vec<String> {
    let mut ids = Vec::new();
    let mut used: HashMap<String, usize> = HashMap::new();
    let mut text: Option<String> = None;

    for event in parser {
        match event {
            Event::Start(Tag::Heading(_, None, _)) => text = Some(String::new()),
            Event::Start(Tag::Heading(_, Some(explicit), _)) => {
                used.entry(explicit.to_string()).or_insert(0);
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some(buf) = text.as_mut() {
                    buf.push_str(&t);
                }
            }
            Event::End(Tag::Heading(..)) => {
                if let Some(buf) = text.take() {
                    ids.push(unique_slug(&buf, &mut used));
                }
            }
            _ => {}
        }
    }
    ids
}

fn unique_slug(text: &str, used: &mut HashMap<String, usize>) -> String {
    let base = slugify(text);
    let count = used.entry(base.clone()).or_insert(0);
    let slug = if *count == 0 {
        base.clone()
    } else {
        format!("{base}-{count}")
    };
    *count += 1;
    slug
}

/// Lowercase slug: alphanumerics and `_` kept, whitespace and `-` become
/// `-`, everything else dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_alphanumeric() || c == '_' {
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' {
            slug.push('-');
        }
    }
    if slug.is_empty() {
        "heading".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_gfm_tables_and_strikethrough() {
        let html = GfmConverter::new()
            .to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n")
            .unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn passes_raw_html_through() {
        let html = GfmConverter::new()
            .to_html("<img src=\"a.png\">\n")
            .unwrap();
        assert!(html.contains("<img src=\"a.png\">"));
    }

    #[test]
    fn generates_unique_heading_ids() {
        let html = GfmConverter::new()
            .to_html("# Getting Started\n\n## Getting Started\n\n## `cfg` file\n")
            .unwrap();
        assert!(html.contains(r#"<h1 id="getting-started">"#), "{html}");
        assert!(html.contains(r#"<h2 id="getting-started-1">"#), "{html}");
        assert!(html.contains(r#"<h2 id="cfg-file">"#), "{html}");
    }

    #[test]
    fn keeps_explicit_heading_ids() {
        let html = GfmConverter::new()
            .to_html("# Intro {#custom}\n\n# Next\n")
            .unwrap();
        assert!(html.contains(r#"<h1 id="custom">"#), "{html}");
        assert!(html.contains(r#"<h1 id="next">"#), "{html}");
    }

    #[test]
    fn slugify_drops_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("snake_case"), "snake_case");
        assert_eq!(slugify("???"), "heading");
    }
}
