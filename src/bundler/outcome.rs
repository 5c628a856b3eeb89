//! Compile outcome types.
//!
//! Contains types for representing what a finished bundler run produced.

use std::time::Duration;

/// Outcome of a single compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The page compiled; stats report attached
    Success(BundleStats),
    /// The page failed to compile; the dispatch loop recovers from this
    Failed(CompileFailure),
}

impl BuildOutcome {
    /// Check if the outcome indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success(_))
    }

    /// Check if the outcome indicates a failed compile.
    pub fn is_failure(&self) -> bool {
        matches!(self, BuildOutcome::Failed(_))
    }

    /// Stats for a successful compile, if any.
    pub fn stats(&self) -> Option<&BundleStats> {
        match self {
            BuildOutcome::Success(stats) => Some(stats),
            BuildOutcome::Failed(_) => None,
        }
    }

    /// Failure details, if any.
    pub fn failure(&self) -> Option<&CompileFailure> {
        match self {
            BuildOutcome::Success(_) => None,
            BuildOutcome::Failed(failure) => Some(failure),
        }
    }
}

impl std::fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildOutcome::Success(_) => write!(f, "success"),
            BuildOutcome::Failed(failure) => write!(f, "failed: {}", failure.summary),
        }
    }
}

/// Report and timing for a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleStats {
    /// Human-readable report text emitted by the bundler
    pub report: String,
    /// Warning lines pulled out of the report
    pub warnings: Vec<String>,
    /// Wall-clock compile time
    pub duration: Duration,
}

impl BundleStats {
    /// Create stats from a raw report, extracting warning lines.
    pub fn new(report: String, duration: Duration) -> Self {
        let warnings = extract_warnings(&report);
        Self { report, warnings, duration }
    }

    /// Stats with no report text (quiet bundlers).
    pub fn empty(duration: Duration) -> Self {
        Self { report: String::new(), warnings: vec![], duration }
    }

    /// Check whether the report carried warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Details of a failed compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    /// One-line summary, suitable for a status line
    pub summary: String,
    /// Full error text from the bundler
    pub detail: String,
    /// Wall-clock time until the failure surfaced
    pub duration: Duration,
}

impl CompileFailure {
    /// Create a failure with a summary and full detail text.
    pub fn new(summary: String, detail: String, duration: Duration) -> Self {
        Self { summary, detail, duration }
    }
}

impl std::fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.summary)
    }
}

/// Pull warning lines out of a bundler report.
fn extract_warnings(report: &str) -> Vec<String> {
    report
        .lines()
        .filter(|line| {
            let lowered = line.to_ascii_lowercase();
            lowered.contains("warning") && !lowered.contains("0 warnings")
        })
        .map(|line| line.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        let outcome = BuildOutcome::Success(BundleStats::empty(Duration::from_millis(5)));
        assert!(outcome.is_success());
        assert!(!outcome.is_failure());
        assert!(outcome.stats().is_some());
        assert!(outcome.failure().is_none());
        assert_eq!(outcome.to_string(), "success");
    }

    #[test]
    fn test_outcome_failure() {
        let outcome = BuildOutcome::Failed(CompileFailure::new(
            "Module not found".to_string(),
            "Module not found: ./missing in pages/home".to_string(),
            Duration::from_millis(80),
        ));
        assert!(outcome.is_failure());
        assert!(outcome.stats().is_none());
        assert_eq!(outcome.to_string(), "failed: Module not found");
    }

    #[test]
    fn test_stats_extracts_warnings() {
        let report = "asset main.js 120 KiB\nWARNING in ./src/app.js\nunused variable\ncompiled with 1 warning";
        let stats = BundleStats::new(report.to_string(), Duration::ZERO);
        assert!(stats.has_warnings());
        assert_eq!(stats.warnings.len(), 2);
        assert_eq!(stats.warnings[0], "WARNING in ./src/app.js");
    }

    #[test]
    fn test_stats_no_warnings() {
        let stats = BundleStats::new("compiled successfully".to_string(), Duration::ZERO);
        assert!(!stats.has_warnings());
    }
}
