//! Dispatch status reporting.
//!
//! Streams start / progress / error / completion notifications to a
//! terminal sink built around an animated spinner. Supports multiple
//! output formats including console (with colors) and JSON.
//!
//! # Example
//!
//! ```ignore
//! use pagepack::status::{StatusSink, ConsoleStatus, StatusEvent};
//!
//! let sink = ConsoleStatus::new();
//! sink.report(StatusEvent::JobStarted { page: "home".to_string(), message: None });
//! sink.report(StatusEvent::Progress { page: "home".to_string(), percent: 100 });
//! sink.finish();
//! ```

use std::io::Write;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::bundler::{BundleStats, CompileFailure};
use crate::bundler::config::BuildMode;

/// When to suspend the spinner around printed notifications.
///
/// `All` keeps scrollback clean by pausing the animation for every print;
/// `Errors` lets routine notifications ride the spinner line and only
/// pauses for failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SuspendPolicy {
    /// Pause the spinner around every notification
    #[default]
    All,
    /// Pause only around error notifications
    Errors,
}

/// Events produced while dispatching a batch.
#[derive(Debug, Clone)]
pub enum StatusEvent {
    /// Dispatch accepted a batch and selected a mode
    BatchStarted {
        /// Number of jobs in the batch
        jobs: usize,
        /// Governing build mode
        mode: BuildMode,
    },
    /// A job was submitted
    JobStarted {
        /// Page display name
        page: String,
        /// Start message from the descriptor, if any
        message: Option<String>,
    },
    /// Compile progress for a page; 0 and 100 are always emitted
    Progress {
        /// Page display name
        page: String,
        /// Completion percentage
        percent: u8,
    },
    /// A compile finished cleanly
    JobSucceeded {
        /// Page display name
        page: String,
        /// Completion message from the descriptor, if any
        message: Option<String>,
        /// Stats report from the bundler
        stats: BundleStats,
    },
    /// A compile failed; the batch continues
    JobFailed {
        /// Page display name
        page: String,
        /// Failure summary and detail
        failure: CompileFailure,
    },
    /// A watched page picked up source changes
    Recompiling {
        /// Page display name
        page: String,
        /// Number of changed paths in the batch
        changed: usize,
    },
    /// One-shot jobs are done; watched pages remain armed
    Watching {
        /// Number of pages being watched
        pages: usize,
    },
    /// The batch finished (one-shot jobs only)
    BatchFinished {
        /// First-pass successes
        succeeded: usize,
        /// First-pass failures
        failed: usize,
        /// Total wall-clock time in milliseconds
        duration_ms: u64,
    },
}

/// Trait for status sinks.
pub trait StatusSink: Send + Sync {
    /// Report a status event.
    fn report(&self, event: StatusEvent);

    /// Check if this sink wants the full stats report.
    fn is_verbose(&self) -> bool {
        false
    }

    /// Stop any animation and flush pending output.
    fn finish(&self) {}
}

/// A status sink that discards all events.
#[derive(Debug, Default)]
pub struct NullStatus;

impl NullStatus {
    /// Create a new null status sink.
    pub fn new() -> Self {
        Self
    }
}

impl StatusSink for NullStatus {
    fn report(&self, _event: StatusEvent) {
        // Discard all events
    }
}

const MOON_FRAMES: &[&str] = &["🌑", "🌒", "🌓", "🌔", "🌕", "🌖", "🌗", "🌘", " "];
const LINE_FRAMES: &[&str] = &["-", "\\", "|", "/", " "];
const DOT_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "];

/// Spinner frame set for a configured name.
pub fn spinner_frames(name: &str) -> &'static [&'static str] {
    match name {
        "moon" => MOON_FRAMES,
        "line" => LINE_FRAMES,
        _ => DOT_FRAMES,
    }
}

/// Console status sink with a spinner and optional colors.
pub struct ConsoleStatus {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to print the full stats report
    verbose: bool,
    /// Spinner suspension policy
    suspend: SuspendPolicy,
    /// Terminal spinner; hidden when not attached to a tty
    spinner: ProgressBar,
    /// Output writer (for testing)
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleStatus")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .field("suspend", &self.suspend)
            .finish()
    }
}

impl ConsoleStatus {
    /// Create a console sink writing to stderr.
    ///
    /// The spinner animates only when stderr is a terminal; colors follow
    /// the same check.
    pub fn new() -> Self {
        let interactive = atty::is(atty::Stream::Stderr);
        let spinner = if interactive {
            ProgressBar::new_spinner().with_style(spinner_style(MOON_FRAMES))
        } else {
            ProgressBar::hidden()
        };
        Self {
            use_colors: interactive,
            verbose: false,
            suspend: SuspendPolicy::All,
            spinner,
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console sink that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false, // Disable colors for custom output
            verbose: false,
            suspend: SuspendPolicy::All,
            spinner: ProgressBar::hidden(),
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Set whether to use colors.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the spinner suspension policy.
    pub fn with_suspend_policy(mut self, policy: SuspendPolicy) -> Self {
        self.suspend = policy;
        self
    }

    /// Select a spinner frame set by name ("moon", "line", "dots").
    pub fn with_spinner(self, name: &str) -> Self {
        if !self.spinner.is_hidden() {
            self.spinner.set_style(spinner_style(spinner_frames(name)));
        }
        self
    }

    /// Format a colored string.
    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Green color code.
    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    /// Yellow color code.
    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    /// Red color code.
    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    /// Cyan color code.
    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    /// Write a line to output.
    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }

    /// Print a notification, pairing spinner suspension per policy.
    fn print(&self, line: &str, is_error: bool) {
        if !self.spinner.is_hidden() && (self.suspend == SuspendPolicy::All || is_error) {
            self.spinner.suspend(|| self.writeln(line));
        } else {
            self.writeln(line);
        }
    }

    /// Render a stats report per the verbose setting.
    fn render_report(&self, report: &str) -> String {
        let text = if self.verbose {
            report.to_string()
        } else {
            condense_report(report)
        };
        self.colorize_lines(&text)
    }

    /// Highlight error and warning lines.
    fn colorize_lines(&self, text: &str) -> String {
        text.lines()
            .map(|line| {
                let lowered = line.to_ascii_lowercase();
                if lowered.contains("error") {
                    self.red(line)
                } else if lowered.contains("warning") {
                    self.yellow(line)
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ConsoleStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for ConsoleStatus {
    fn report(&self, event: StatusEvent) {
        match event {
            StatusEvent::BatchStarted { jobs, mode } => {
                if !self.spinner.is_hidden() {
                    self.spinner
                        .enable_steady_tick(std::time::Duration::from_millis(80));
                }
                self.print(
                    &format!(
                        "{} Dispatching {} page{} ({})...",
                        self.cyan("[dispatch]"),
                        jobs,
                        if jobs == 1 { "" } else { "s" },
                        mode
                    ),
                    false,
                );
            }
            StatusEvent::JobStarted { page, message } => {
                let line = message.unwrap_or_else(|| format!("Building '{}'...", page));
                self.print(&line, false);
                self.spinner.set_message(page);
            }
            StatusEvent::Progress { page, percent } => {
                self.spinner.set_message(format!("{} {}%", page, percent));
            }
            StatusEvent::JobSucceeded { page, message, stats } => {
                let report = self.render_report(&stats.report);
                if !report.trim().is_empty() {
                    self.print(&report, false);
                }
                let line = message.unwrap_or_else(|| format!("Compiled '{}'", page));
                self.print(
                    &format!(
                        "{} {} {} ({})",
                        self.green("✔"),
                        line,
                        clock_time(),
                        format_duration(stats.duration.as_millis() as u64)
                    ),
                    false,
                );
            }
            StatusEvent::JobFailed { page, failure } => {
                self.print(
                    &format!("{} '{}' failed: {}", self.red("✖"), page, failure.summary),
                    true,
                );
                if !failure.detail.trim().is_empty() && failure.detail.trim() != failure.summary {
                    self.print(&self.colorize_lines(&failure.detail), true);
                }
                self.spinner.set_message(format!("{} failed", page));
            }
            StatusEvent::Recompiling { page, changed } => {
                self.print(
                    &format!(
                        "[{}] '{}': {} file{} changed, rebuilding...",
                        clock_time(),
                        page,
                        changed,
                        if changed == 1 { "" } else { "s" }
                    ),
                    false,
                );
                self.spinner.set_message(format!("{} rebuilding", page));
            }
            StatusEvent::Watching { pages } => {
                self.print(
                    &self.cyan(&format!(
                        "Watching {} page{} for changes... (Ctrl+C to stop)",
                        pages,
                        if pages == 1 { "" } else { "s" }
                    )),
                    false,
                );
            }
            StatusEvent::BatchFinished { succeeded, failed, duration_ms } => {
                if failed == 0 {
                    self.print(
                        &format!(
                            "\n{} {} page{} built in {}",
                            self.green("[done]"),
                            succeeded,
                            if succeeded == 1 { "" } else { "s" },
                            format_duration(duration_ms)
                        ),
                        false,
                    );
                } else {
                    self.print(
                        &format!(
                            "\n{} Dispatch finished: {} succeeded, {} failed in {}",
                            self.red("[error]"),
                            succeeded,
                            failed,
                            format_duration(duration_ms)
                        ),
                        true,
                    );
                }
            }
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

/// JSON status sink for machine-readable output.
pub struct JsonStatus {
    /// Output writer
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStatus").finish()
    }
}

impl JsonStatus {
    /// Create a new JSON status sink writing to stderr.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(std::io::stderr())) }
    }

    /// Create a JSON status sink that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }

    /// Write a JSON line to output.
    fn write_json(&self, json: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", json);
        }
    }
}

impl Default for JsonStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for JsonStatus {
    fn report(&self, event: StatusEvent) {
        let json = match event {
            StatusEvent::BatchStarted { jobs, mode } => {
                format!(r#"{{"event":"batch_started","jobs":{},"mode":"{}"}}"#, jobs, mode)
            }
            StatusEvent::JobStarted { page, message } => {
                let message = match message {
                    Some(m) => format!(r#","message":"{}""#, escape_json(&m)),
                    None => String::new(),
                };
                format!(r#"{{"event":"job_started","page":"{}"{}}}"#, escape_json(&page), message)
            }
            StatusEvent::Progress { page, percent } => {
                format!(
                    r#"{{"event":"progress","page":"{}","percent":{}}}"#,
                    escape_json(&page),
                    percent
                )
            }
            StatusEvent::JobSucceeded { page, message, stats } => {
                let message = match message {
                    Some(m) => format!(r#","message":"{}""#, escape_json(&m)),
                    None => String::new(),
                };
                format!(
                    r#"{{"event":"job_succeeded","page":"{}","duration_ms":{},"warnings":{},"report":"{}"{}}}"#,
                    escape_json(&page),
                    stats.duration.as_millis(),
                    stats.warnings.len(),
                    escape_json(&stats.report),
                    message
                )
            }
            StatusEvent::JobFailed { page, failure } => {
                format!(
                    r#"{{"event":"job_failed","page":"{}","error":"{}","detail":"{}"}}"#,
                    escape_json(&page),
                    escape_json(&failure.summary),
                    escape_json(&failure.detail)
                )
            }
            StatusEvent::Recompiling { page, changed } => {
                format!(
                    r#"{{"event":"recompiling","page":"{}","changed":{}}}"#,
                    escape_json(&page),
                    changed
                )
            }
            StatusEvent::Watching { pages } => {
                format!(r#"{{"event":"watching","pages":{}}}"#, pages)
            }
            StatusEvent::BatchFinished { succeeded, failed, duration_ms } => {
                format!(
                    r#"{{"event":"batch_finished","succeeded":{},"failed":{},"duration_ms":{}}}"#,
                    succeeded, failed, duration_ms
                )
            }
        };
        self.write_json(&json);
    }
}

/// Condense a stats report down to its error and warning lines.
///
/// Keeps marker lines, the indented module trace beneath them, and the
/// closing summary line. Mirrors an errors-only report preset.
pub fn condense_report(report: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_trace = false;

    for line in report.lines() {
        let lowered = line.to_ascii_lowercase();
        if lowered.contains("error") || lowered.contains("warning") {
            lines.push(line.to_string());
            in_trace = true;
        } else if in_trace && (line.starts_with(' ') || line.starts_with('\t')) {
            lines.push(line.to_string());
        } else {
            in_trace = false;
        }
    }

    if let Some(last) = report.lines().rev().find(|l| !l.trim().is_empty()) {
        if lines.last().map(String::as_str) != Some(last) {
            lines.push(last.to_string());
        }
    }

    lines.join("\n")
}

/// Format a duration in milliseconds to a human-readable string.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}

/// Current wall-clock time as a 12-hour "h:mm:ss AM/PM" string.
fn clock_time() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format_clock(secs)
}

fn format_clock(epoch_secs: u64) -> String {
    let day = epoch_secs % 86_400;
    let hour = day / 3600;
    let minute = (day % 3600) / 60;
    let second = day % 60;
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02}:{:02} {}", hour12, minute, second, suffix)
}

fn spinner_style(frames: &[&'static str]) -> ProgressStyle {
    ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(frames)
}

/// Escape a string for JSON output.
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}
