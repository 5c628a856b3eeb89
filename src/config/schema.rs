//! Configuration schema types for `pagepack.toml`
//!
//! Defines the structure and validation rules for dispatcher configuration.

use crate::status::SuspendPolicy;
use serde::{Deserialize, Serialize};

/// Watch loop timing section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// File-change debounce window in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Compile handle poll interval in milliseconds
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_poll_ms() -> u64 {
    50
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms(), poll_ms: default_poll_ms() }
    }
}

/// Terminal reporting section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Spinner frame set: "moon", "dots", or "line"
    #[serde(default = "default_spinner")]
    pub spinner: String,
    /// Which prints pause the spinner
    #[serde(default)]
    pub suspend: SuspendPolicy,
    /// ANSI colors (forced off when stderr is not a tty)
    #[serde(default = "default_true")]
    pub colors: bool,
}

fn default_spinner() -> String {
    "moon".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { spinner: default_spinner(), suspend: SuspendPolicy::default(), colors: true }
    }
}

/// Bundler invocation section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BundlerConfig {
    /// Argv prefix for the bundler shim; empty means use the cached runtime
    #[serde(default)]
    pub command: Vec<String>,
}

/// Complete pagepack.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PagepackConfig {
    /// Watch loop timing
    #[serde(default)]
    pub watch: WatchConfig,
    /// Terminal reporting
    #[serde(default)]
    pub report: ReportConfig,
    /// Bundler invocation
    #[serde(default)]
    pub bundler: BundlerConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "watch.debounce_ms")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pagepack.toml: '{}' {}", self.field, self.message)
    }
}

impl PagepackConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.watch.debounce_ms == 0 {
            errors.push(ConfigValidationError {
                field: "watch.debounce_ms".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if self.watch.poll_ms == 0 {
            errors.push(ConfigValidationError {
                field: "watch.poll_ms".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if !matches!(self.report.spinner.as_str(), "moon" | "dots" | "line") {
            errors.push(ConfigValidationError {
                field: "report.spinner".to_string(),
                message: "must be one of: moon, dots, line".to_string(),
            });
        }

        if let Some(program) = self.bundler.command.first() {
            if program.is_empty() {
                errors.push(ConfigValidationError {
                    field: "bundler.command".to_string(),
                    message: "first element must be a program name".to_string(),
                });
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
