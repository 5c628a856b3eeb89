//! Project management command implementations (project, page, cache)

use std::path::Path;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Run the project command
pub fn run_project(name: &str) -> ExitCode {
    use crate::scaffold::{init_project, project_name, ProjectInit};

    let path = Path::new(name);
    match init_project(path, name) {
        Ok(ProjectInit::Existing) => {
            let existing = project_name(path)
                .ok()
                .flatten()
                .unwrap_or_else(|| name.to_string());
            println!("Use existing project: {}", existing);
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(ProjectInit::Created) => {
            println!("Creating new project: {}", name);
            println!();
            println!("To get started, create a page:");
            println!("  cd {}", name);
            println!("  ppk page <page name>");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the page command
pub fn run_page(name: &str) -> ExitCode {
    use crate::npm;
    use crate::scaffold::{init_page, ScaffoldError};

    let project_dir = Path::new(".");
    match init_page(project_dir, name) {
        Ok(page_dir) => {
            // Page modules resolve across the project through NODE_PATH
            let env_file = project_dir.join(".env");
            if env_file.exists() {
                match npm::append_node_path(&env_file, Path::new(name)) {
                    Ok(true) => println!("Added '{}' to NODE_PATH", name),
                    Ok(false) => {}
                    Err(e) => eprintln!("Warning: could not update .env: {}", e),
                }
            }

            println!("Created page at {}", page_dir.display());
            println!("Run 'ppk develop' to use this page.");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(ScaffoldError::DirectoryExists(_)) => {
            eprintln!("Error: Directory already exists!");
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the cache command
pub fn run_cache() -> ExitCode {
    use crate::cache;

    println!("Building the bundler runtime cache...");
    match cache::build_cache() {
        Ok(dir) => {
            println!("Cache dir: {}", dir.display());
            println!("Done!");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error building cache: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the clear-cache command
pub fn run_clear_cache() -> ExitCode {
    use crate::cache;

    match cache::clear_cache() {
        Ok(Some(dir)) => {
            println!("Removed cache dir: {}", dir.display());
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(None) => {
            println!("No cache to remove.");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error clearing cache: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
