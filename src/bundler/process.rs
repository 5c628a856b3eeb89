//! External bundler process driver.
//!
//! Spawns the bundler shim (a Node script taking one JSON config
//! argument), passes the mode environment on the child only, and polls
//! for completion so the dispatch loop never blocks. Child output goes
//! to temp capture files rather than pipes; a pipe would stall a chatty
//! bundler once the kernel buffer fills, since nothing reads it until
//! the process exits.
//!
//! Exit status protocol: 0 is a clean compile, 1 is a compile failure
//! (recovered, reported, loop continues), anything else is an internal
//! bundler fault and aborts the dispatch.

use std::fs::File;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::bundler::config::BundleConfig;
use crate::bundler::outcome::{BuildOutcome, BundleStats, CompileFailure};
use crate::bundler::task::{Bundler, BundlerError, CompileHandle};

static CAPTURE_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Bundler implementation backed by a child process.
///
/// The command line is the configured program plus its fixed arguments,
/// with the JSON-encoded [`BundleConfig`] appended as the final argument.
#[derive(Debug, Clone)]
pub struct ProcessBundler {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessBundler {
    /// Create a bundler invoking `program` with fixed leading arguments.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    /// Create a bundler from a full argv, if one was given.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program, args.to_vec()))
    }

    fn command_line(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

impl Bundler for ProcessBundler {
    fn start(&self, config: &BundleConfig) -> Result<Box<dyn CompileHandle>, BundlerError> {
        let payload = config.to_json()?;

        let stdout_path = capture_path("out");
        let stderr_path = capture_path("err");
        let stdout_file = File::create(&stdout_path).map_err(BundlerError::Output)?;
        let stderr_file = File::create(&stderr_path).map_err(BundlerError::Output)?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(&payload)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_file))
            .stderr(Stdio::from(stderr_file));
        if !config.working_dir.as_os_str().is_empty() {
            command.current_dir(&config.working_dir);
        }
        for (key, value) in &config.env {
            command.env(key, value);
        }

        let child = command.spawn().map_err(|source| BundlerError::Spawn {
            command: self.command_line(),
            source,
        })?;

        Ok(Box::new(ProcessHandle {
            child: Some(child),
            stdout_path,
            stderr_path,
            started: Instant::now(),
        }))
    }
}

/// Handle for one in-flight bundler process.
pub struct ProcessHandle {
    child: Option<Child>,
    stdout_path: PathBuf,
    stderr_path: PathBuf,
    started: Instant,
}

impl ProcessHandle {
    fn collect(&mut self, status: std::process::ExitStatus) -> Result<BuildOutcome, BundlerError> {
        let duration = self.started.elapsed();
        let stdout = read_capture(&self.stdout_path)?;
        let stderr = read_capture(&self.stderr_path)?;
        self.discard_captures();

        if status.success() {
            return Ok(BuildOutcome::Success(BundleStats::new(stdout, duration)));
        }

        let detail = if stderr.trim().is_empty() { stdout } else { stderr };
        match status.code() {
            Some(1) => {
                let summary = detail
                    .lines()
                    .find(|line| !line.trim().is_empty())
                    .unwrap_or("bundler exited with status 1")
                    .trim()
                    .to_string();
                Ok(BuildOutcome::Failed(CompileFailure::new(summary, detail, duration)))
            }
            Some(code) => Err(BundlerError::Internal { status: code, detail }),
            // Killed by a signal; treat like an internal fault
            None => Err(BundlerError::Internal { status: -1, detail }),
        }
    }

    fn discard_captures(&self) {
        let _ = std::fs::remove_file(&self.stdout_path);
        let _ = std::fs::remove_file(&self.stderr_path);
    }
}

impl CompileHandle for ProcessHandle {
    fn poll(&mut self) -> Result<Option<BuildOutcome>, BundlerError> {
        let child = match self.child.as_mut() {
            Some(child) => child,
            None => return Ok(None),
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                self.child = None;
                self.collect(status).map(Some)
            }
            Ok(None) => Ok(None),
            Err(e) => Err(BundlerError::Poll(e)),
        }
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.discard_captures();
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn capture_path(stream: &str) -> PathBuf {
    let seq = CAPTURE_SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("ppk-bundle-{}-{}.{}", std::process::id(), seq, stream))
}

fn read_capture(path: &PathBuf) -> Result<String, BundlerError> {
    std::fs::read_to_string(path).map_err(BundlerError::Output)
}
