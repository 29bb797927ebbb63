//! Headless-browser HTML to PDF rendering.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::contract::Renderer;
use crate::error::RenderError;
use crate::template::tag_end;

/// Executables tried on `PATH` when `CHROME_BIN` is not set.
const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

/// Page geometry and limits for [`ChromeRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    /// Paper width in inches.
    pub paper_width: f64,
    /// Paper height in inches.
    pub paper_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub print_background: bool,
    pub timeout: Duration,
    /// Browser executable; searched on `PATH` when absent.
    pub chrome_bin: Option<PathBuf>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            paper_width: 8.27,
            paper_height: 11.69,
            margin_top: 0.4,
            margin_bottom: 0.4,
            margin_left: 0.4,
            margin_right: 0.4,
            print_background: true,
            timeout: Duration::from_secs(30),
            chrome_bin: None,
        }
    }
}

impl PdfOptions {
    /// Defaults, with `CHROME_BIN` taken from the environment when set.
    pub fn from_env() -> Self {
        let chrome_bin = env::var_os("CHROME_BIN")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self {
            chrome_bin,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn page_style(&self) -> String {
        let mut style = format!(
            "<style>@page {{ size: {}in {}in; margin: {}in {}in {}in {}in; }}",
            self.paper_width,
            self.paper_height,
            self.margin_top,
            self.margin_right,
            self.margin_bottom,
            self.margin_left
        );
        if self.print_background {
            style.push_str(
                " html { -webkit-print-color-adjust: exact; print-color-adjust: exact; }",
            );
        }
        style.push_str("</style>");
        style
    }
}

/// Places the page style in the document head.
///
/// The style goes right after an opening `<head>` tag. Without one, a head
/// carrying the style is opened after `<html>`, or after the doctype when
/// that is all there is, so the doctype always stays first. Bare fragments
/// get the style in front.
pub fn with_page_style(html: &str, options: &PdfOptions) -> String {
    let style = options.page_style();
    let lower = html.to_ascii_lowercase();

    let (at, insert) = if let Some(at) = tag_end(&lower, "<head") {
        (at, style)
    } else if let Some(at) = tag_end(&lower, "<html").or_else(|| tag_end(&lower, "<!doctype")) {
        (at, format!("<head>{style}</head>"))
    } else {
        (0, style)
    };

    let mut out = String::with_capacity(html.len() + insert.len());
    out.push_str(&html[..at]);
    out.push_str(&insert);
    out.push_str(&html[at..]);
    out
}

/// Renders through a headless Chromium-family browser.
pub struct ChromeRenderer {
    options: PdfOptions,
}

impl ChromeRenderer {
    pub fn new(options: PdfOptions) -> Self {
        Self { options }
    }

    fn browser(&self) -> Result<PathBuf, RenderError> {
        if let Some(bin) = &self.options.chrome_bin {
            return Ok(bin.clone());
        }
        let path = env::var_os("PATH").ok_or(RenderError::BrowserNotFound)?;
        env::split_paths(&path)
            .flat_map(|dir| BROWSER_CANDIDATES.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
            .ok_or(RenderError::BrowserNotFound)
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, html: &str, output: &Path) -> Result<(), RenderError> {
        let browser = self.browser()?;
        let page = with_page_style(html, &self.options);

        // Both temp files are removed on drop, whichever way this returns.
        let mut html_file = tempfile::Builder::new()
            .prefix("docpress-")
            .suffix(".html")
            .tempfile()?;
        std::io::Write::write_all(&mut html_file, page.as_bytes())?;

        let output_dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let pdf_file = tempfile::Builder::new()
            .prefix(".docpress-")
            .suffix(".pdf")
            .tempfile_in(output_dir)?;

        let mut command = Command::new(&browser);
        command
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--allow-file-access-from-files")
            .arg("--no-pdf-header-footer")
            .arg("--virtual-time-budget=500")
            .arg(format!("--print-to-pdf={}", pdf_file.path().display()))
            .arg(format!("file://{}", html_file.path().display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            browser = %browser.display(),
            output = %output.display(),
            timeout = ?self.options.timeout,
            "Launching headless browser"
        );
        let child = command.spawn().map_err(|source| RenderError::Launch {
            program: browser.display().to_string(),
            source,
        })?;

        let finished = tokio::time::timeout(self.options.timeout, child.wait_with_output()).await;
        let result = match finished {
            Err(_) => {
                error!(output = %output.display(), timeout = ?self.options.timeout, "Render timed out");
                return Err(RenderError::Timeout(self.options.timeout));
            }
            Ok(result) => result?,
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            return Err(RenderError::Exit {
                status: result.status,
                stderr,
            });
        }
        if std::fs::metadata(pdf_file.path())?.len() == 0 {
            return Err(RenderError::MissingOutput(output.to_path_buf()));
        }

        pdf_file
            .persist(output)
            .map_err(|e| RenderError::Io(e.error))?;
        info!(output = %output.display(), "Wrote PDF");
        Ok(())
    }
}
