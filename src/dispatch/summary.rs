//! Dispatch result tracking.

use std::time::Duration;

/// Lifecycle of one job inside a dispatch run.
///
/// Jobs move Idle -> Compiling -> Succeeded or Failed; watch-mode jobs
/// re-enter Compiling when their sources change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Accepted but not yet submitted
    Idle,
    /// A bundler run is in flight
    Compiling,
    /// Most recent compile succeeded
    Succeeded,
    /// Most recent compile failed
    Failed,
}

impl JobState {
    /// Whether the job has at least one finished compile.
    pub fn is_done(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Idle => "idle",
            JobState::Compiling => "compiling",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of a single job across a dispatch run.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Display name of the page
    pub page: String,
    /// State at the end of the run
    pub state: JobState,
    /// How many compiles ran (watch mode rebuilds count)
    pub compiles: usize,
}

/// Aggregate result of a dispatch run.
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    /// Per-job outcomes in submission order
    pub jobs: Vec<JobRecord>,
    /// Wall-clock duration of the whole run
    pub total_duration: Duration,
}

impl DispatchSummary {
    /// Create an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job record.
    pub fn record(&mut self, record: JobRecord) {
        self.jobs.push(record);
    }

    /// Number of jobs whose last compile succeeded.
    pub fn succeeded(&self) -> usize {
        self.jobs.iter().filter(|j| j.state == JobState::Succeeded).count()
    }

    /// Number of jobs whose last compile failed.
    pub fn failed(&self) -> usize {
        self.jobs.iter().filter(|j| j.state == JobState::Failed).count()
    }

    /// Total compiles across every job.
    pub fn total_compiles(&self) -> usize {
        self.jobs.iter().map(|j| j.compiles).sum()
    }

    /// True when no job ended in failure.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// One-line result for command output.
    pub fn summary_line(&self) -> String {
        let duration = crate::status::format_duration(self.total_duration.as_millis() as u64);
        if self.is_success() {
            format!(
                "Dispatched {} jobs ({} compiles) in {}",
                self.jobs.len(),
                self.total_compiles(),
                duration
            )
        } else {
            format!(
                "Dispatched {} jobs in {}: {} succeeded, {} failed",
                self.jobs.len(),
                duration,
                self.succeeded(),
                self.failed()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(page: &str, state: JobState, compiles: usize) -> JobRecord {
        JobRecord { page: page.to_string(), state, compiles }
    }

    #[test]
    fn test_empty_summary_is_success() {
        let summary = DispatchSummary::new();
        assert!(summary.is_success());
        assert_eq!(summary.succeeded(), 0);
        assert_eq!(summary.failed(), 0);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = DispatchSummary::new();
        summary.record(record("home", JobState::Succeeded, 1));
        summary.record(record("about", JobState::Failed, 2));
        summary.record(record("shop", JobState::Succeeded, 3));

        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.total_compiles(), 6);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_summary_line_mentions_failures() {
        let mut summary = DispatchSummary::new();
        summary.record(record("home", JobState::Succeeded, 1));
        assert!(summary.summary_line().contains("1 jobs"));

        summary.record(record("about", JobState::Failed, 1));
        let line = summary.summary_line();
        assert!(line.contains("1 succeeded"));
        assert!(line.contains("1 failed"));
    }

    #[test]
    fn test_job_state_is_done() {
        assert!(!JobState::Idle.is_done());
        assert!(!JobState::Compiling.is_done());
        assert!(JobState::Succeeded.is_done());
        assert!(JobState::Failed.is_done());
    }

    #[test]
    fn test_job_state_display() {
        assert_eq!(JobState::Compiling.to_string(), "compiling");
        assert_eq!(JobState::Failed.to_string(), "failed");
    }
}
