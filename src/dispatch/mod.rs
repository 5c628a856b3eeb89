//! Dispatch module for pagepack
//!
//! Accepts batches of build job descriptors and drives them through the
//! bundler on a single cooperative loop.
//!
//! # Overview
//!
//! A dispatch run consists of:
//! - **Validation**: Reject malformed descriptors before anything starts
//! - **Submission**: Build one bundler config per job and start them all
//! - **Settling**: Poll compile handles and file changes until every job
//!   has a first outcome; watch-mode jobs then stay armed for rebuilds
//!
//! # Example
//!
//! ```ignore
//! use pagepack::bundler::ProcessBundler;
//! use pagepack::dispatch::Dispatcher;
//! use pagepack::job::JobDescriptor;
//! use pagepack::status::ConsoleStatus;
//!
//! let jobs = JobDescriptor::parse_batch(payload)?;
//! let dispatcher = Dispatcher::new(
//!     Box::new(ProcessBundler::new("pagepack-bundle", vec![])),
//!     Box::new(ConsoleStatus::new()),
//! );
//!
//! let summary = dispatcher.run(&jobs)?;
//! println!("{} pages built", summary.succeeded());
//! ```

pub mod dispatcher;
pub mod summary;

pub use dispatcher::*;
pub use summary::*;
