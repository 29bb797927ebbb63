use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::JobError;

/// A job entry exactly as written in the configuration file.
///
/// `type` is kept as text so that an unknown value fails only its own job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEntry {
    pub source: String,
    pub output: PathBuf,
    #[serde(rename = "type")]
    pub kind: String,
}

impl JobEntry {
    pub fn into_job(self) -> Result<Job, JobError> {
        match JobKind::parse(&self.kind) {
            Some(kind) => Ok(Job::new(self.source, self.output, kind)),
            None => Err(JobError::UnknownJobType {
                kind: self.kind,
                source_pattern: self.source,
            }),
        }
    }
}

/// One render job as declared in the job configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Glob pattern, rooted at the working directory.
    pub source: String,
    /// Output directory for `Independent`, output file for the merge strategies.
    pub output: PathBuf,
    pub kind: JobKind,
}

impl Job {
    pub fn new(source: impl Into<String>, output: impl Into<PathBuf>, kind: JobKind) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            kind,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            source = %self.source,
            output = %self.output.display(),
            kind = %self.kind,
            "Loaded job"
        );
        debug!(?self, "Job loaded (full debug)");
    }
}

/// How the files matched by a job are combined into documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Every marker file becomes its own document, named after its folder.
    Independent,
    /// All matches are concatenated into one document.
    Merge,
    /// Marker files only, each under a heading naming its folder.
    MergeWithHeaders,
}

impl JobKind {
    /// Parses the configuration spelling of a job type.
    ///
    /// Accepts the historical names (`single`, `subfolders`, `combine`) as well
    /// as the descriptive ones.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "single" | "merge" => Some(JobKind::Merge),
            "subfolders" | "independent" => Some(JobKind::Independent),
            "combine" | "merge-with-headers" | "merge_with_headers" => {
                Some(JobKind::MergeWithHeaders)
            }
            _ => None,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobKind::Independent => "independent",
            JobKind::Merge => "merge",
            JobKind::MergeWithHeaders => "merge-with-headers",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_historical_and_descriptive_names() {
        assert_eq!(JobKind::parse("single"), Some(JobKind::Merge));
        assert_eq!(JobKind::parse("subfolders"), Some(JobKind::Independent));
        assert_eq!(JobKind::parse("combine"), Some(JobKind::MergeWithHeaders));
        assert_eq!(
            JobKind::parse("merge-with-headers"),
            Some(JobKind::MergeWithHeaders)
        );
        assert_eq!(JobKind::parse("Single"), None);
        assert_eq!(JobKind::parse("zip"), None);
    }

    #[test]
    fn unknown_entry_type_is_a_job_error() {
        let entry = JobEntry {
            source: "docs/*.md".into(),
            output: "out.pdf".into(),
            kind: "bogus".into(),
        };
        let err = entry.into_job().unwrap_err();
        assert!(
            matches!(err, JobError::UnknownJobType { ref kind, .. } if kind == "bogus"),
            "{err:?}"
        );
    }
}
