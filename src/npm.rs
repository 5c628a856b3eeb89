//! npm integration helpers
//!
//! Locates the project's npm prefix, root, and bin directories by asking
//! npm itself, reads `NODE_PATH` from the project `.env`, and runs
//! logged npm subprocesses for cache installation. Every command line is
//! echoed (truncated) before it runs.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Error talking to npm or the project environment
#[derive(Debug, Error)]
pub enum NpmError {
    /// The npm binary was not found on PATH
    #[error("Failed to run npm ({0}); is npm installed?")]
    Missing(#[source] std::io::Error),
    /// A subprocess ran but did not succeed
    #[error("`{command}` failed: {detail}")]
    Failed { command: String, detail: String },
    /// NODE_PATH entry cannot be joined into the env value
    #[error("Invalid NODE_PATH entry: {0}")]
    InvalidPath(String),
    /// File I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Get the npm prefix directory (the one holding package.json).
pub fn npm_prefix(cwd: &Path) -> Result<PathBuf, NpmError> {
    path_query("npm", "prefix", cwd)
}

/// Get the npm root directory (node_modules).
pub fn npm_root(cwd: &Path) -> Result<PathBuf, NpmError> {
    path_query("npm", "root", cwd)
}

/// Get the npm bin directory.
pub fn npm_bin(cwd: &Path) -> Result<PathBuf, NpmError> {
    path_query("npm", "bin", cwd)
}

/// Run `npm install` in a directory, echoing output.
pub fn install(dir: &Path) -> Result<(), NpmError> {
    let mut command = Command::new("npm");
    command.arg("install").current_dir(dir);
    run_logged(&mut command)
}

/// Ask a program for a single path on stdout.
fn path_query(program: &str, subcommand: &str, cwd: &Path) -> Result<PathBuf, NpmError> {
    let output = Command::new(program)
        .arg(subcommand)
        .current_dir(cwd)
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => NpmError::Missing(e),
            _ => NpmError::Io(e),
        })?;

    if !output.status.success() {
        return Err(NpmError::Failed {
            command: format!("{} {}", program, subcommand),
            detail: failure_detail(&output.stderr, output.status),
        });
    }

    Ok(PathBuf::from(String::from_utf8_lossy(&output.stdout).trim()))
}

/// Run a command to completion, echoing its command line first and its
/// output afterwards. Non-zero exit becomes an error.
pub fn run_logged(command: &mut Command) -> Result<(), NpmError> {
    let line = command_line(command);
    println!("Run: {}", truncate_command(&line));

    let output = command.output().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => NpmError::Missing(e),
        _ => NpmError::Io(e),
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        println!("{}", stdout.trim_end());
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            eprintln!("{}", stderr.trim_end());
        }
        return Err(NpmError::Failed {
            command: line,
            detail: failure_detail(&output.stderr, output.status),
        });
    }

    Ok(())
}

fn failure_detail(stderr: &[u8], status: std::process::ExitStatus) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        status.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Render a command as the line it would be typed as.
pub fn command_line(command: &Command) -> String {
    let mut line = command.get_program().to_string_lossy().into_owned();
    for arg in command.get_args() {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

/// Cap an echoed command line at 200 characters.
pub fn truncate_command(line: &str) -> String {
    if line.chars().count() > 200 {
        let shown: String = line.chars().take(200).collect();
        format!("{} ...", shown)
    } else {
        line.to_string()
    }
}

/// Read the NODE_PATH value from a `.env` file.
///
/// Returns `Ok(None)` when the file or the key is absent. Surrounding
/// single or double quotes are stripped.
pub fn read_node_path(env_file: &Path) -> Result<Option<String>, NpmError> {
    if !env_file.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(env_file)?;
    for line in contents.lines() {
        if let Some(value) = line.trim().strip_prefix("NODE_PATH=") {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            return Ok(Some(value.to_string()));
        }
    }

    Ok(None)
}

/// Style include paths for the bundler, from the project `.env`.
pub fn style_paths(env_file: &Path) -> Result<Vec<PathBuf>, NpmError> {
    match read_node_path(env_file)? {
        Some(value) => Ok(env::split_paths(&value).collect()),
        None => Ok(vec![]),
    }
}

/// Append a path to the NODE_PATH entry of a `.env` file.
///
/// Returns `Ok(true)` when the entry was added, `Ok(false)` when it was
/// already present. A missing NODE_PATH starts from ".".
pub fn append_node_path(env_file: &Path, entry: &Path) -> Result<bool, NpmError> {
    let current = read_node_path(env_file)?.unwrap_or_else(|| ".".to_string());

    let mut paths: Vec<PathBuf> = env::split_paths(&current).collect();
    if paths.iter().any(|p| p == entry) {
        return Ok(false);
    }
    paths.push(entry.to_path_buf());

    let joined = env::join_paths(paths)
        .map_err(|_| NpmError::InvalidPath(entry.display().to_string()))?;
    write_node_path(env_file, &joined.to_string_lossy())?;
    Ok(true)
}

/// Rewrite the NODE_PATH line of a `.env` file, keeping other lines.
fn write_node_path(env_file: &Path, value: &str) -> Result<(), NpmError> {
    let mut lines: Vec<String> = if env_file.exists() {
        fs::read_to_string(env_file)?.lines().map(|l| l.to_string()).collect()
    } else {
        Vec::new()
    };

    let entry = format!("NODE_PATH={}", value);
    match lines.iter_mut().find(|l| l.trim().starts_with("NODE_PATH=")) {
        Some(line) => *line = entry,
        None => lines.push(entry),
    }

    fs::write(env_file, lines.join("\n") + "\n")?;
    Ok(())
}
