//! Page build command implementations (develop, deploy)

use std::path::Path;
use std::process::ExitCode;

use super::EXIT_ERROR;

/// Run the develop command: dev bundles, rebuilt on change
pub fn run_develop(
    src: Option<&Path>,
    dest: Option<&Path>,
    static_url: Option<&str>,
    no_watch: bool,
    verbose: bool,
    no_color: bool,
) -> ExitCode {
    run_pages(src, dest, static_url, verbose, no_color, !no_watch, false)
}

/// Run the deploy command: production bundles, one pass
pub fn run_deploy(
    src: Option<&Path>,
    dest: Option<&Path>,
    static_url: Option<&str>,
    verbose: bool,
    no_color: bool,
) -> ExitCode {
    run_pages(src, dest, static_url, verbose, no_color, false, true)
}

fn run_pages(
    src: Option<&Path>,
    dest: Option<&Path>,
    static_url: Option<&str>,
    verbose: bool,
    no_color: bool,
    watch: bool,
    deploy: bool,
) -> ExitCode {
    use crate::discovery::{DiscoveryError, PageDiscovery, ProjectEnv};
    use crate::{cache, npm};

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let npm_prefix = match npm::npm_prefix(&cwd) {
        Ok(prefix) => prefix,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let npm_root = match npm::npm_root(&cwd) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let fallback_public = match cache::public_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let env = ProjectEnv::new(npm_prefix, npm_root, fallback_public);
    let discovery = PageDiscovery::new()
        .with_source(src.map(|p| p.to_path_buf()))
        .with_dest(dest.map(|p| p.to_path_buf()))
        .with_static_url(static_url.map(|s| s.to_string()))
        .with_watch(watch)
        .with_deploy(deploy)
        .with_verbose(verbose);

    let discovered = match discovery.discover(&env) {
        Ok(discovered) => discovered,
        Err(DiscoveryError::NoPages(_)) => {
            eprintln!("You must create a page first!");
            eprintln!("Run 'ppk page <page name>' to create one.");
            return ExitCode::from(EXIT_ERROR);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    for notice in &discovered.notices {
        println!("Courtesy Notice: {}", notice);
    }

    super::dispatch::run_jobs(&discovered.jobs, false, None, no_color)
}
