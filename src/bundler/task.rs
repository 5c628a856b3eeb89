//! Compile task abstraction.
//!
//! A `Bundler` starts compiles; each compile is represented by a
//! `CompileHandle` that the dispatch loop polls until it yields a
//! [`BuildOutcome`](crate::bundler::BuildOutcome). Handles are
//! single-shot and cancellable; watch mode is implemented by requesting
//! a fresh handle per change batch.

use thiserror::Error;

use crate::bundler::config::BundleConfig;
use crate::bundler::outcome::BuildOutcome;

/// Errors from the bundler machinery itself.
///
/// These are distinct from a failed compile: they mean the bundler could
/// not be run or observed at all, and they abort the dispatch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BundlerError {
    /// The bundler process could not be spawned
    #[error("failed to start bundler '{command}': {source}")]
    Spawn {
        /// Command line that failed to start
        command: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the bundler process failed
    #[error("failed to poll bundler process: {0}")]
    Poll(std::io::Error),

    /// The bundler's captured output could not be read back
    #[error("failed to read bundler output: {0}")]
    Output(std::io::Error),

    /// The bundler reported an internal fault rather than a compile result
    #[error("bundler internal error (status {status}): {detail}")]
    Internal {
        /// Raw exit status of the bundler process
        status: i32,
        /// Whatever the bundler printed before dying
        detail: String,
    },

    /// The bundle configuration could not be encoded for the bundler
    #[error("failed to encode bundle config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Starts compiles for bundle configurations.
pub trait Bundler {
    /// Begin compiling; returns immediately with a pollable handle.
    fn start(&self, config: &BundleConfig) -> Result<Box<dyn CompileHandle>, BundlerError>;
}

/// An in-flight compile.
pub trait CompileHandle {
    /// Check for completion without blocking.
    ///
    /// Returns `Ok(None)` while the compile is still running and
    /// `Ok(Some(outcome))` exactly once when it finishes. Polling after
    /// completion or cancellation keeps returning `Ok(None)`.
    fn poll(&mut self) -> Result<Option<BuildOutcome>, BundlerError>;

    /// Stop the compile early. Best effort; safe to call twice.
    fn cancel(&mut self);
}

impl std::fmt::Debug for dyn CompileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn CompileHandle")
    }
}
