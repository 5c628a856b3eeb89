//! Pagepack - Build dispatcher for page bundle jobs
//!
//! This library provides functionality to:
//! - Decode JSON build-job descriptors and validate batches up front
//! - Drive an external bundler process per page in dev or production mode
//! - Watch page sources and redispatch compiles on change
//! - Report batch progress through spinner or JSON status sinks

pub mod bundler;
pub mod cache;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod job;
pub mod npm;
pub mod scaffold;
pub mod status;
pub mod watch;
