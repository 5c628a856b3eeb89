//! Bundler seam for pagepack
//!
//! The dispatcher never bundles anything itself; it drives an external
//! bundler process through the traits in this module.
//!
//! # Overview
//!
//! The seam consists of:
//! - **Config**: Map a job descriptor onto the paths and mode knobs the
//!   bundler consumes
//! - **Task**: Start compiles and poll cancellable handles for outcomes
//! - **Process**: The production implementation, spawning the bundler
//!   shim as a child process
//!
//! # Example
//!
//! ```ignore
//! use pagepack::bundler::{ProcessBundler, Bundler};
//! use pagepack::bundler::config::{builder_for, BuildMode, StatsDetail};
//!
//! let bundler = ProcessBundler::new("node", vec![shim.display().to_string()]);
//! let builder = builder_for(BuildMode::Development, vec![]);
//! let mut handle = bundler.start(&builder.build(&job, StatsDetail::Condensed))?;
//! while handle.poll()?.is_none() { /* stay responsive */ }
//! ```

pub mod config;
pub mod outcome;
pub mod process;
pub mod task;

pub use config::*;
pub use outcome::*;
pub use process::*;
pub use task::*;
