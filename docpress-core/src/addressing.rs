//! How catalog entries are addressed: from a source-control remote, or
//! relative to the catalog file.

use std::path::{Component, Path, PathBuf};
use std::process::Command;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::debug;

/// Characters escaped inside one path segment. `/` never appears in a
/// segment, so it survives as the separator.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Branch assumed when the current one cannot be determined.
pub const DEFAULT_BRANCH: &str = "main";

/// A discovered source-control remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    /// Normalised browsing URL, `https://host/owner/repo`.
    pub url: String,
    pub branch: String,
    /// Working tree root, when git reported one.
    pub toplevel: Option<PathBuf>,
}

impl RemoteRepo {
    /// `<url>/blob/<branch>`
    pub fn browse_root(&self) -> String {
        format!("{}/blob/{}", self.url, encode_path(&self.branch))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addressing {
    /// Links point into the remote's browsing UI. `prefix` is the scan
    /// root's path inside the repository.
    Remote { browse_root: String, prefix: PathBuf },
    /// Links are relative to the catalog file's directory.
    Relative { catalog_dir: PathBuf },
}

impl Addressing {
    pub fn remote(repo: &RemoteRepo, scan_root: &Path) -> Self {
        Addressing::Remote {
            browse_root: repo.browse_root(),
            prefix: repo_prefix(scan_root, repo.toplevel.as_deref()),
        }
    }

    pub fn relative(catalog_file: &Path) -> Self {
        let catalog_dir = match catalog_file.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Addressing::Relative { catalog_dir }
    }

    /// Percent-escaped link for the file at `rel` below `scan_root`.
    pub fn address(&self, scan_root: &Path, rel: &Path) -> String {
        match self {
            Addressing::Remote {
                browse_root,
                prefix,
            } => {
                let path = slash_path(&prefix.join(rel));
                format!("{}/{}", browse_root, encode_path(path.trim_start_matches('/')))
            }
            Addressing::Relative { catalog_dir } => {
                let target = scan_root.join(rel);
                encode_path(&slash_path(&relative_path(catalog_dir, &target)))
            }
        }
    }
}

/// Scan root relative to the repository's top level, or the scan root as
/// given when that cannot be worked out.
fn repo_prefix(scan_root: &Path, toplevel: Option<&Path>) -> PathBuf {
    let inside = toplevel.and_then(|top| {
        let root = scan_root.canonicalize().ok()?;
        let top = top.canonicalize().ok()?;
        root.strip_prefix(&top).ok().map(Path::to_path_buf)
    });
    inside.unwrap_or_else(|| normalize(scan_root))
}

/// Escapes every segment of a `/`-separated path.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// `/`-separated rendering of a path, dropping `.` components.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| match c {
            Component::RootDir => String::new(),
            other => other.as_os_str().to_string_lossy().into_owned(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Lexically normalised path: `.` removed, `..` folded where possible.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path from directory `from` to `to`, computed lexically on absolute forms.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let absolute = |p: &Path| std::path::absolute(p).map(|a| normalize(&a)).unwrap_or_else(|_| normalize(p));
    let from = absolute(from);
    let to = absolute(to);

    let from_parts: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();
    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from_parts.len() {
        rel.push("..");
    }
    for part in &to_parts[common..] {
        rel.push(part.as_os_str());
    }
    rel
}

/// Turns a remote URL into `https://host/owner/repo`.
///
/// Accepts scp-like `user@host:owner/repo`, `ssh://`, `git://` and
/// `http(s)://` forms. Credentials and ports are dropped, as is a trailing
/// `.git`.
pub fn normalize_remote_url(url: &str) -> Option<String> {
    let url = url.trim();
    let (host, path) = if let Some((scheme, rest)) = url.split_once("://") {
        if !matches!(scheme, "http" | "https" | "ssh" | "git" | "git+ssh") {
            return None;
        }
        let (authority, path) = rest.split_once('/')?;
        let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        let host = host.split_once(':').map_or(host, |(h, _)| h);
        (host, path)
    } else {
        let (authority, path) = url.split_once(':')?;
        let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        (host, path)
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    if host.is_empty() || path.is_empty() {
        return None;
    }
    Some(format!("https://{host}/{path}"))
}

/// Best-effort discovery of the `origin` remote and current branch of the
/// repository containing `dir`. Any failure yields `None`.
pub fn discover_remote(dir: &Path) -> Option<RemoteRepo> {
    let raw = git(dir, &["config", "--get", "remote.origin.url"])?;
    let Some(url) = normalize_remote_url(&raw) else {
        debug!(remote = %raw, "Unrecognised remote URL, using relative addressing");
        return None;
    };

    let branch = match git(dir, &["rev-parse", "--abbrev-ref", "HEAD"]) {
        Some(b) if b == "HEAD" => git(dir, &["rev-parse", "HEAD"]).unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
        Some(b) => b,
        None => DEFAULT_BRANCH.to_string(),
    };
    let toplevel = git(dir, &["rev-parse", "--show-toplevel"]).map(PathBuf::from);

    debug!(url = %url, branch = %branch, "Discovered remote");
    Some(RemoteRepo {
        url,
        branch,
        toplevel,
    })
}

fn git(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
