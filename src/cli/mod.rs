//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod dispatch;
mod pages;
mod project;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{
    find_config, load_config, merge_cli_overrides, CliOverrides, ConfigError, PagepackConfig,
};
use crate::status::{ConsoleStatus, JsonStatus, StatusSink};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;

/// Load project settings with command-line overrides applied.
pub(crate) fn load_settings(
    spinner: Option<&str>,
    no_color: bool,
) -> Result<PagepackConfig, ConfigError> {
    let mut config = load_config(find_config().as_deref())?;
    let overrides = CliOverrides {
        spinner: spinner.map(|s| s.to_string()),
        no_color,
        ..Default::default()
    };
    merge_cli_overrides(&mut config, &overrides);
    Ok(config)
}

/// Build the status sink the dispatcher reports to.
pub(crate) fn build_sink(config: &PagepackConfig, json: bool, verbose: bool) -> Box<dyn StatusSink> {
    if json {
        return Box::new(JsonStatus::new());
    }
    Box::new(
        ConsoleStatus::new()
            .with_spinner(&config.report.spinner)
            .with_suspend_policy(config.report.suspend)
            .with_colors(config.report.colors)
            .with_verbose(verbose),
    )
}

/// pagepack - dispatch page bundle jobs from JSON descriptors
#[derive(Parser)]
#[command(name = "ppk")]
#[command(about = "pagepack - dispatch page bundle jobs from JSON descriptors")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single build job from a JSON object
    Job {
        /// JSON object describing the job
        payload: String,
    },

    /// Dispatch a batch of build jobs from a JSON array
    Dispatch {
        /// JSON array of job descriptors
        payload: String,

        /// Emit JSON lines instead of spinner output
        #[arg(long)]
        json: bool,

        /// Spinner style: moon, dots, line
        #[arg(long)]
        spinner: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Build every page in development mode and watch for changes
    Develop {
        /// Page entry file or directory holding pages (default: current directory)
        #[arg(long, alias = "source")]
        src: Option<PathBuf>,

        /// Destination base directory (default: build/ under the project)
        #[arg(long, alias = "destination")]
        dest: Option<PathBuf>,

        /// Public URL pattern; "{page name}" is substituted per page
        #[arg(long)]
        static_url: Option<String>,

        /// Build once instead of watching
        #[arg(long)]
        no_watch: bool,

        /// Full stats report
        #[arg(short, long)]
        verbose: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Build every page for production
    Deploy {
        /// Page entry file or directory holding pages (default: current directory)
        #[arg(long, alias = "source")]
        src: Option<PathBuf>,

        /// Destination base directory (default: build/ under the project)
        #[arg(long, alias = "destination")]
        dest: Option<PathBuf>,

        /// Public URL pattern; "{page name}" is substituted per page
        #[arg(long)]
        static_url: Option<String>,

        /// Full stats report
        #[arg(short, long)]
        verbose: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Create a new project
    Project {
        /// Project name, also the directory created
        name: String,
    },

    /// Create a new page in the current project
    Page {
        /// Page name, also the directory created
        name: String,
    },

    /// Build the bundler runtime cache
    Cache,

    /// Remove the bundler runtime cache
    ClearCache,
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Job { payload } => dispatch::run_job(&payload),
        Commands::Dispatch { payload, json, spinner, no_color } => {
            dispatch::run_dispatch(&payload, json, spinner.as_deref(), no_color)
        }
        Commands::Develop { src, dest, static_url, no_watch, verbose, no_color } => {
            pages::run_develop(
                src.as_deref(),
                dest.as_deref(),
                static_url.as_deref(),
                no_watch,
                verbose,
                no_color,
            )
        }
        Commands::Deploy { src, dest, static_url, verbose, no_color } => pages::run_deploy(
            src.as_deref(),
            dest.as_deref(),
            static_url.as_deref(),
            verbose,
            no_color,
        ),
        Commands::Project { name } => project::run_project(&name),
        Commands::Page { name } => project::run_page(&name),
        Commands::Cache => project::run_cache(),
        Commands::ClearCache => project::run_clear_cache(),
    }
}
