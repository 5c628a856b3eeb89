//! Configuration module for the pagepack dispatcher
//!
//! Provides types and parsing for `pagepack.toml` configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
