//! Configuration loading and discovery for `pagepack.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::PagepackConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse pagepack.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override the spinner frame set
    pub spinner: Option<String>,
    /// Disable ANSI colors
    pub no_color: bool,
    /// Override the bundler argv prefix
    pub bundler_command: Option<Vec<String>>,
}

/// Find pagepack.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for pagepack.toml
/// 2. Check XDG_CONFIG_HOME/pagepack/pagepack.toml (or ~/.config/pagepack/pagepack.toml)
///
/// # Returns
/// - `Some(path)` if a pagepack.toml file is found
/// - `None` if no config file is found
pub fn find_config() -> Option<PathBuf> {
    // First try walking up from current directory
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    // Fall back to XDG config
    find_xdg_config()
}

/// Find pagepack.toml in XDG config directory.
///
/// Checks XDG_CONFIG_HOME/pagepack/pagepack.toml or ~/.config/pagepack/pagepack.toml
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("pagepack").join("pagepack.toml");
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find pagepack.toml by walking up from a specific directory.
///
/// This is the internal implementation that allows specifying the start directory,
/// useful for testing.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join("pagepack.toml");
        if config_path.exists() {
            return Some(config_path);
        }

        // Move to parent directory
        if !current.pop() {
            // Reached root, no config found
            return None;
        }
    }
}

/// Load configuration from a pagepack.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
///
/// # Arguments
/// - `path` - Optional path to a pagepack.toml file
///
/// # Returns
/// - `Ok(PagepackConfig)` on success
/// - `Err(ConfigError)` if the file cannot be read, parsed, or validated
pub fn load_config(path: Option<&Path>) -> Result<PagepackConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(PagepackConfig::default()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<PagepackConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: PagepackConfig = toml::from_str(&contents)?;

    // Validate the config
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut PagepackConfig, overrides: &CliOverrides) {
    if let Some(ref spinner) = overrides.spinner {
        config.report.spinner = spinner.clone();
    }

    if overrides.no_color {
        config.report.colors = false;
    }

    if let Some(ref command) = overrides.bundler_command {
        config.bundler.command = command.clone();
    }
}

/// Resolve a path relative to a base directory.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the base.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("pagepack.toml");
        File::create(&config_path)
            .expect("should create config file")
            .write_all(b"[watch]\ndebounce_ms = 200")
            .expect("should write config content");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("pagepack.toml");
        File::create(&config_path)
            .expect("should create config file")
            .write_all(b"")
            .expect("should write config content");

        // Create a subdirectory
        let subdir = temp.path().join("pages").join("home");
        fs::create_dir_all(&subdir).expect("should create subdirectories");

        let found = find_config_from(subdir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_not_found() {
        let temp = TempDir::new().expect("should create temp dir");
        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, None);
    }

    #[test]
    #[serial]
    fn test_find_config_walks_up_from_cwd() {
        let temp = TempDir::new().expect("should create temp dir");
        File::create(temp.path().join("pagepack.toml"))
            .expect("should create config file")
            .write_all(b"[report]\nspinner = \"line\"")
            .expect("should write config content");
        let subdir = temp.path().join("pages");
        fs::create_dir_all(&subdir).expect("should create subdir");

        let original_dir = env::current_dir().expect("should read current dir");
        env::set_current_dir(&subdir).expect("should enter temp dir");

        let found = find_config();

        env::set_current_dir(original_dir).expect("should restore current dir");

        // Compare by content; the OS may canonicalize the temp path
        let path = found.expect("config should be found from a subdirectory");
        assert!(path.ends_with("pagepack.toml"));
        let config = load_config(Some(&path)).expect("found config should load");
        assert_eq!(config.report.spinner, "line");
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("pagepack.toml");
        File::create(&config_path)
            .expect("should create config file")
            .write_all(
                br#"
[watch]
debounce_ms = 300
poll_ms = 25

[report]
spinner = "line"
"#,
            )
            .expect("should write config content");

        let config = load_config(Some(&config_path)).expect("should load valid config");
        assert_eq!(config.watch.debounce_ms, 300);
        assert_eq!(config.watch.poll_ms, 25);
        assert_eq!(config.report.spinner, "line");
    }

    #[test]
    fn test_load_config_missing_file_is_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("nonexistent.toml");

        // When file doesn't exist, load_config with explicit path should error
        let result = load_config(Some(&config_path));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("pagepack.toml");
        File::create(&config_path)
            .expect("should create config file")
            .write_all(b"this is not valid toml {{{")
            .expect("should write invalid config");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_validation_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("pagepack.toml");
        File::create(&config_path)
            .expect("should create config file")
            .write_all(
                br#"
[watch]
debounce_ms = 0

[report]
spinner = "cube"
"#,
            )
            .expect("should write invalid config");

        let result = load_config(Some(&config_path));
        let message = match result {
            Err(ConfigError::Validation(errors)) => errors.join("\n"),
            other => panic!("expected validation error, got {:?}", other),
        };
        assert!(message.contains("watch.debounce_ms"));
        assert!(message.contains("report.spinner"));
    }

    #[test]
    fn test_merge_cli_overrides_spinner() {
        let mut config = PagepackConfig::default();
        let overrides =
            CliOverrides { spinner: Some("dots".to_string()), ..Default::default() };

        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.report.spinner, "dots");
    }

    #[test]
    fn test_merge_cli_overrides_no_color() {
        let mut config = PagepackConfig::default();
        assert!(config.report.colors);

        let overrides = CliOverrides { no_color: true, ..Default::default() };

        merge_cli_overrides(&mut config, &overrides);
        assert!(!config.report.colors);
    }

    #[test]
    fn test_merge_cli_overrides_bundler_command() {
        let mut config = PagepackConfig::default();
        let overrides = CliOverrides {
            bundler_command: Some(vec!["node".to_string(), "bundle.js".to_string()]),
            ..Default::default()
        };

        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.bundler.command, vec!["node", "bundle.js"]);
    }

    #[test]
    fn test_resolve_path_absolute() {
        let base = Path::new("/project");
        let absolute = Path::new("/other/path");
        assert_eq!(resolve_path(base, absolute), PathBuf::from("/other/path"));
    }

    #[test]
    fn test_resolve_path_relative() {
        let base = Path::new("/project");
        let relative = Path::new("pages/home");
        assert_eq!(resolve_path(base, relative), PathBuf::from("/project/pages/home"));
    }
}
