//! `load_config`: reads the YAML job list.
//!
//! The file is a top-level sequence of `{source, output, type}` mappings:
//!
//! ```yaml
//! - source: "docs/**/README.md"
//!   output: build/guides
//!   type: subfolders
//! - source: "docs/intro/*.md"
//!   output: build/intro.pdf
//!   type: single
//! ```
//!
//! # Errors
//! An unreadable file, YAML that does not parse, or an entry missing one of
//! its three fields is a configuration error (`anyhow::Error`) and aborts the
//! run before any job executes. An unrecognised `type` is NOT an error here:
//! the entry is returned as-is and fails on its own when the pipeline runs.

use anyhow::{Context, Result};
use docpress_core::config::{JobEntry, JobKind};
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

pub const DEFAULT_CONFIG: &str = "render.yaml";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Vec<JobEntry>> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading job configuration");

    let content = fs::read_to_string(path_ref)
        .map_err(|e| {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            e
        })
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;

    let entries: Vec<JobEntry> = match serde_yaml::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!(
                "Failed to parse config YAML {}: {e}",
                path_ref.display()
            ));
        }
    };

    for entry in &entries {
        if JobKind::parse(&entry.kind).is_none() {
            warn!(source = %entry.source, kind = %entry.kind, "Unknown job type, the job will be reported as failed");
        }
    }
    info!(config_path = ?path_ref, jobs = entries.len(), "Parsed job configuration");
    Ok(entries)
}
