//! Build-job descriptors decoded from JSON dispatch payloads
//!
//! A descriptor is one page build: where the entry lives, where the bundle
//! goes, and how the run should behave (watch / verbose / deploy). Payload
//! keys use the spaced form (`"dest dir"`), with underscore and short
//! aliases accepted where the single-job entry historically used them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while decoding or validating job descriptors
///
/// These are fatal: the dispatcher refuses the whole batch before any
/// configuration is built or any bundler process is spawned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// The payload was not valid JSON or was missing a required key
    #[error("invalid job payload: {0}")]
    Json(#[from] serde_json::Error),

    /// One or more descriptors carried empty values for required fields
    #[error("invalid job descriptor:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

/// A single invalid field within a descriptor
#[derive(Debug, Clone)]
pub struct FieldIssue {
    /// Payload key of the offending field (e.g., "dest dir")
    pub field: String,
    /// What was wrong with it
    pub message: String,
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' {}", self.field, self.message)
    }
}

/// One page build, as submitted to the dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Source entry file for the page (its index module)
    #[serde(rename = "src path", alias = "src")]
    pub entry: PathBuf,
    /// Directory receiving the emitted bundle
    #[serde(rename = "dest dir")]
    pub dest_dir: PathBuf,
    /// Page source directory, also the watch root
    #[serde(rename = "src dir")]
    pub src_dir: PathBuf,
    /// node_modules directory resolved for this page
    #[serde(rename = "npm root", alias = "node_modules")]
    pub npm_root: PathBuf,
    /// HTML template the bundle is injected into
    #[serde(rename = "html template", alias = "html_template")]
    pub html_template: PathBuf,
    /// Rebuild on source changes until the process exits
    pub watch: bool,
    /// Full stats report instead of the condensed one
    #[serde(default)]
    pub verbose: bool,
    /// Production build (minified, production env for the bundler)
    #[serde(default)]
    pub deploy: bool,
    /// Display name; derived from the entry path when absent
    #[serde(rename = "page name", default)]
    pub page_name: String,
    /// Text for the start notification
    #[serde(rename = "start msg", default)]
    pub start_msg: Option<String>,
    /// Text for the completion notification
    #[serde(rename = "complete msg", default)]
    pub complete_msg: Option<String>,
    /// Public URL prefix baked into the bundle
    #[serde(rename = "public url", default = "default_public_url")]
    pub public_url: String,
    /// Project root; defaults to the parent of npm_root
    #[serde(rename = "npm prefix", default)]
    pub npm_prefix: Option<PathBuf>,
}

fn default_public_url() -> String {
    ".".to_string()
}

impl JobDescriptor {
    /// Decode a single descriptor from a JSON object
    pub fn parse(payload: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Decode a batch of descriptors from a JSON array
    pub fn parse_batch(payload: &str) -> Result<Vec<Self>, ConfigurationError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Name shown in notifications for this page
    ///
    /// Uses the explicit page name when present, otherwise the directory
    /// the entry file lives in, otherwise the entry file stem.
    pub fn display_name(&self) -> String {
        if !self.page_name.is_empty() {
            return self.page_name.clone();
        }
        self.entry
            .parent()
            .and_then(Path::file_name)
            .or_else(|| self.entry.file_stem())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "page".to_string())
    }

    /// Directory the bundler process runs in
    pub fn working_dir(&self) -> &Path {
        if let Some(prefix) = self.npm_prefix.as_deref() {
            return prefix;
        }
        match self.npm_root.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Check required path fields for empty values
    ///
    /// Decoding already guarantees the keys are present; this catches
    /// descriptors that carry them with empty strings. Never touches the
    /// filesystem.
    pub fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        let required: [(&str, &Path); 4] = [
            ("src path", &self.entry),
            ("dest dir", &self.dest_dir),
            ("src dir", &self.src_dir),
            ("html template", &self.html_template),
        ];

        for (field, value) in required {
            if value.as_os_str().is_empty() {
                issues.push(FieldIssue {
                    field: field.to_string(),
                    message: "must be a non-empty path".to_string(),
                });
            }
        }

        issues
    }
}

/// Validate every descriptor in a batch up front
///
/// Collects issues across all descriptors so a bad batch is reported in
/// one pass, prefixed by position and page name.
pub fn validate_batch(jobs: &[JobDescriptor]) -> Result<(), ConfigurationError> {
    let mut problems = Vec::new();

    for (index, job) in jobs.iter().enumerate() {
        for issue in job.validate() {
            problems.push(format!("job {} ({}): {}", index, job.display_name(), issue));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigurationError::Invalid(problems))
    }
}
