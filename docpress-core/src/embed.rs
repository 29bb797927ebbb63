//! Asset embedding: rewrites local `<img src>` references into `data:` URLs.
//!
//! Scanning is tag-level, not a markup parse. Any `<img ...>` tag is
//! inspected and only its `src` attribute value is considered; everything
//! else in the tag is preserved byte for byte.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use tracing::{debug, warn};

/// Mime type used when the extension is not in [`MIME_TYPES`].
pub const FALLBACK_MIME: &str = "image/png";

const MIME_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("bmp", "image/bmp"),
    ("ico", "image/x-icon"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
];

/// How an image reference is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef<'a> {
    /// Already a `data:` URL.
    InlineData,
    /// Absolute URL with a scheme, or protocol-relative.
    Remote,
    /// Path to resolve against the document's base directory.
    LocalRelative(&'a str),
}

pub fn classify(src: &str) -> AssetRef<'_> {
    let trimmed = src.trim();
    if trimmed
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
    {
        return AssetRef::InlineData;
    }
    if trimmed.starts_with("//") || has_url_scheme(trimmed) {
        return AssetRef::Remote;
    }
    AssetRef::LocalRelative(trimmed)
}

fn has_url_scheme(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once(':') else {
        return false;
    };
    // Single letters are drive prefixes, not schemes.
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Mime type for `path`, judged by its extension.
pub fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_MIME)
}

fn img_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<img\b[^>]*>").expect("valid img regex"))
}

fn src_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(\s)src\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid src regex")
    })
}

/// Embeds every readable local image in `html`.
///
/// Unreadable images are logged and left as they were. Content that only
/// holds `data:` or remote references comes back unchanged.
pub fn embed_images(html: &str, base_dir: &Path) -> String {
    img_tag()
        .replace_all(html, |tag: &Captures| embed_tag(&tag[0], base_dir).into_owned())
        .into_owned()
}

fn embed_tag<'t>(tag: &'t str, base_dir: &Path) -> Cow<'t, str> {
    let Some(caps) = src_attr().captures(tag) else {
        return Cow::Borrowed(tag);
    };
    let Some(value) = caps.get(2).or_else(|| caps.get(3)) else {
        return Cow::Borrowed(tag);
    };

    let AssetRef::LocalRelative(src) = classify(value.as_str()) else {
        return Cow::Borrowed(tag);
    };

    match image_data_url(src, base_dir) {
        Ok(data_url) => {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            let mut rewritten = String::with_capacity(tag.len() + data_url.len());
            rewritten.push_str(&tag[..whole.start]);
            rewritten.push_str(&caps[1]);
            rewritten.push_str("src=\"");
            rewritten.push_str(&data_url);
            rewritten.push('"');
            rewritten.push_str(&tag[whole.end..]);
            Cow::Owned(rewritten)
        }
        Err(e) => {
            warn!(
                src,
                base_dir = %base_dir.display(),
                error = %e,
                "Failed to embed image, leaving reference untouched"
            );
            Cow::Borrowed(tag)
        }
    }
}

/// Reads `src` relative to `base_dir` and encodes it as a `data:` URL.
pub fn image_data_url(src: &str, base_dir: &Path) -> std::io::Result<String> {
    let path = locate(src, base_dir);
    let bytes = fs::read(&path)?;
    let mime = mime_type(&path);
    debug!(path = %path.display(), mime, size = bytes.len(), "Embedding image");
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

/// Resolves `src` against `base_dir`, retrying percent-decoded when the
/// literal path does not exist.
fn locate(src: &str, base_dir: &Path) -> PathBuf {
    let literal = base_dir.join(src);
    if literal.exists() {
        return literal;
    }
    match percent_decode_str(src).decode_utf8() {
        Ok(decoded) if decoded != src => base_dir.join(decoded.as_ref()),
        _ => literal,
    }
}
