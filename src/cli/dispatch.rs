//! Dispatch command implementations (job, dispatch)

use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::job::JobDescriptor;

/// Run the job command: a single JSON object entry
pub fn run_job(payload: &str) -> ExitCode {
    let job = match JobDescriptor::parse(payload) {
        Ok(job) => job,
        Err(_) => {
            eprintln!("Bad command!");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    run_jobs(&[job], false, None, false)
}

/// Run the dispatch command: a JSON array batch
pub fn run_dispatch(payload: &str, json: bool, spinner: Option<&str>, no_color: bool) -> ExitCode {
    let jobs = match JobDescriptor::parse_batch(payload) {
        Ok(jobs) => jobs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    run_jobs(&jobs, json, spinner, no_color)
}

/// Run descriptors through a dispatcher assembled from project settings.
pub(crate) fn run_jobs(
    jobs: &[JobDescriptor],
    json: bool,
    spinner: Option<&str>,
    no_color: bool,
) -> ExitCode {
    use crate::bundler::{DevelopmentBuilder, ProductionBuilder};
    use crate::dispatch::Dispatcher;
    use std::time::Duration;

    let config = match super::load_settings(spinner, no_color) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let verbose = jobs.first().map(|job| job.verbose).unwrap_or(false);
    let sink = super::build_sink(&config, json, verbose);

    let bundler = match bundler_from_settings(&config) {
        Ok(bundler) => bundler,
        Err(e) => {
            eprintln!("Error preparing the bundler: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let style_paths = style_paths_for(jobs);
    let dispatcher = Dispatcher::new(Box::new(bundler), sink)
        .with_builders(
            Box::new(DevelopmentBuilder::new().with_style_paths(style_paths.clone())),
            Box::new(ProductionBuilder::new().with_style_paths(style_paths)),
        )
        .with_debounce(Duration::from_millis(config.watch.debounce_ms))
        .with_poll_interval(Duration::from_millis(config.watch.poll_ms));

    match dispatcher.run(jobs) {
        Ok(summary) => {
            println!("{}", summary.summary_line());
            if summary.is_success() {
                ExitCode::from(EXIT_SUCCESS)
            } else {
                ExitCode::from(EXIT_ERROR)
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// The configured bundler command, or the cached runtime shim.
///
/// A missing runtime cache is built on first use.
fn bundler_from_settings(
    config: &crate::config::PagepackConfig,
) -> Result<crate::bundler::ProcessBundler, crate::cache::CacheError> {
    use crate::bundler::ProcessBundler;
    use crate::cache;

    if let Some(bundler) = ProcessBundler::from_argv(&config.bundler.command) {
        return Ok(bundler);
    }

    if !cache::is_cached()? {
        println!("Missing pagepack cache dir!");
        println!("Building the bundler runtime (one-time setup)...");
        cache::build_cache()?;
    }

    let (program, args) = cache::runtime_bundler_argv()?;
    Ok(ProcessBundler::new(program, args))
}

/// Style import roots from the project `.env`, when one is present.
fn style_paths_for(jobs: &[JobDescriptor]) -> Vec<std::path::PathBuf> {
    use crate::npm;

    let Some(job) = jobs.first() else {
        return Vec::new();
    };
    let env_file = job.working_dir().join(".env");
    npm::style_paths(&env_file).unwrap_or_default()
}
