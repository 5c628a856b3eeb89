//! Project scaffolding for pagepack
//!
//! Creates new dispatch projects and pages with starter files. The
//! functions here only touch the filesystem; command output and npm
//! integration belong to the CLI layer.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error during project or page scaffolding
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// Directory already exists
    #[error("Directory already exists: {}", .0.display())]
    DirectoryExists(PathBuf),
    /// Failed to create directory
    #[error("Failed to create directory: {0}")]
    CreateDir(std::io::Error),
    /// Failed to write file
    #[error("Failed to write file: {0}")]
    WriteFile(std::io::Error),
    /// Failed to read an existing project file
    #[error("Failed to read file: {0}")]
    ReadFile(std::io::Error),
}

/// Outcome of a project initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectInit {
    /// A fresh project was created
    Created,
    /// The directory already held a project; nothing was written
    Existing,
}

/// Initialize a new dispatch project.
///
/// Creates the project directory with a package.json and the support
/// files pages build against. A directory that already carries a
/// package.json is treated as an existing project and left untouched.
///
/// # Example
/// ```ignore
/// init_project(Path::new("my-site"), "my-site")?;
/// ```
pub fn init_project(path: &Path, name: &str) -> Result<ProjectInit, ScaffoldError> {
    if path.join("package.json").exists() {
        return Ok(ProjectInit::Existing);
    }

    create_dir(path)?;
    create_dir(&path.join("public"))?;

    let package = generate_package_json(name);
    write_file(&path.join("package.json"), &package)?;

    let env = generate_env();
    write_file(&path.join(".env"), &env)?;

    let gitignore = generate_gitignore();
    write_file(&path.join(".gitignore"), &gitignore)?;

    let template = generate_html_template();
    write_file(&path.join("public/index.html"), &template)?;

    Ok(ProjectInit::Created)
}

/// Name recorded in an existing project's package.json, if readable.
pub fn project_name(path: &Path) -> Result<Option<String>, ScaffoldError> {
    let package_path = path.join("package.json");
    if !package_path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&package_path).map_err(ScaffoldError::ReadFile)?;
    let package: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(_) => return Ok(None),
    };
    Ok(package["name"].as_str().map(|name| name.to_string()))
}

/// Create a new page inside a project.
///
/// The page directory gets an entry module and a starter component. The
/// directory must not already exist.
///
/// # Example
/// ```ignore
/// init_page(Path::new("."), "home")?;
/// ```
pub fn init_page(project_dir: &Path, name: &str) -> Result<PathBuf, ScaffoldError> {
    let page_dir = project_dir.join(name);
    if page_dir.exists() {
        return Err(ScaffoldError::DirectoryExists(page_dir));
    }

    create_dir(&page_dir)?;

    let index = generate_page_index();
    write_file(&page_dir.join("index.js"), &index)?;

    let app = generate_page_app(name);
    write_file(&page_dir.join("App.js"), &app)?;

    Ok(page_dir)
}

/// Create a directory and all parent directories.
fn create_dir(path: &Path) -> Result<(), ScaffoldError> {
    fs::create_dir_all(path).map_err(ScaffoldError::CreateDir)
}

/// Write content to a file.
fn write_file(path: &Path, content: &str) -> Result<(), ScaffoldError> {
    fs::write(path, content).map_err(ScaffoldError::WriteFile)
}

// ============================================================================
// Template generation
// ============================================================================

/// Generate package.json for a new project.
fn generate_package_json(name: &str) -> String {
    format!(
        r#"{{
  "name": "{}",
  "version": "1.0.0",
  "private": true,
  "license": "MIT"
}}
"#,
        name
    )
}

/// Generate .env content.
fn generate_env() -> String {
    "NODE_PATH=.\n".to_string()
}

/// Generate .gitignore content.
fn generate_gitignore() -> String {
    r#"# Build output
build/

# Dependencies
node_modules/

# OS files
.DS_Store
Thumbs.db

*.log
"#
    .to_string()
}

/// Generate the project HTML template.
fn generate_html_template() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title><%= htmlWebpackPlugin.options.title %></title>
  </head>
  <body>
    <noscript>You need to enable JavaScript to run this page.</noscript>
    <div id="root"></div>
  </body>
</html>
"#
    .to_string()
}

/// Generate the page entry module.
fn generate_page_index() -> String {
    r#"import React from 'react';
import ReactDOM from 'react-dom/client';
import App from './App';

const root = ReactDOM.createRoot(document.getElementById('root'));
root.render(<App />);
"#
    .to_string()
}

/// Generate the starter page component.
fn generate_page_app(name: &str) -> String {
    format!(
        r#"import React from 'react';

export default function App() {{
  return <h1>Hello from {}!</h1>;
}}
"#,
        name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_project_creates_structure() {
        let temp = TempDir::new().unwrap();
        let project_path = temp.path().join("my-site");

        let outcome = init_project(&project_path, "my-site").unwrap();
        assert_eq!(outcome, ProjectInit::Created);

        assert!(project_path.join("package.json").exists());
        assert!(project_path.join(".env").exists());
        assert!(project_path.join(".gitignore").exists());
        assert!(project_path.join("public/index.html").exists());
    }

    #[test]
    fn test_init_project_package_json_content() {
        let temp = TempDir::new().unwrap();
        let project_path = temp.path().join("my-site");

        init_project(&project_path, "my-site").unwrap();

        let contents = fs::read_to_string(project_path.join("package.json")).unwrap();
        let package: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(package["name"], "my-site");
        assert_eq!(package["version"], "1.0.0");
        assert_eq!(package["license"], "MIT");
    }

    #[test]
    fn test_init_project_existing_is_untouched() {
        let temp = TempDir::new().unwrap();
        let project_path = temp.path().join("existing");
        fs::create_dir_all(&project_path).unwrap();
        fs::write(project_path.join("package.json"), r#"{"name": "older"}"#).unwrap();

        let outcome = init_project(&project_path, "existing").unwrap();
        assert_eq!(outcome, ProjectInit::Existing);

        let contents = fs::read_to_string(project_path.join("package.json")).unwrap();
        assert!(contents.contains("older"));
        assert!(!project_path.join(".env").exists());
    }

    #[test]
    fn test_init_project_in_empty_dir() {
        let temp = TempDir::new().unwrap();
        let project_path = temp.path().join("empty");
        fs::create_dir_all(&project_path).unwrap();

        let outcome = init_project(&project_path, "empty").unwrap();
        assert_eq!(outcome, ProjectInit::Created);
    }

    #[test]
    fn test_init_project_env_content() {
        let temp = TempDir::new().unwrap();
        let project_path = temp.path().join("site");

        init_project(&project_path, "site").unwrap();

        let env = fs::read_to_string(project_path.join(".env")).unwrap();
        assert!(env.contains("NODE_PATH=."));
    }

    #[test]
    fn test_init_project_gitignore_content() {
        let temp = TempDir::new().unwrap();
        let project_path = temp.path().join("site");

        init_project(&project_path, "site").unwrap();

        let gitignore = fs::read_to_string(project_path.join(".gitignore")).unwrap();
        assert!(gitignore.contains("build/"));
        assert!(gitignore.contains("node_modules/"));
    }

    #[test]
    fn test_project_name_from_package() {
        let temp = TempDir::new().unwrap();
        let project_path = temp.path().join("site");
        init_project(&project_path, "site").unwrap();

        assert_eq!(project_name(&project_path).unwrap(), Some("site".to_string()));
        assert_eq!(project_name(temp.path()).unwrap(), None);
    }

    #[test]
    fn test_project_name_tolerates_bad_json() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), "not json").unwrap();

        assert_eq!(project_name(temp.path()).unwrap(), None);
    }

    #[test]
    fn test_init_page_creates_files() {
        let temp = TempDir::new().unwrap();

        let page_dir = init_page(temp.path(), "home").unwrap();
        assert_eq!(page_dir, temp.path().join("home"));

        let index = fs::read_to_string(page_dir.join("index.js")).unwrap();
        assert!(index.contains("import App from './App'"));
        assert!(index.contains("getElementById('root')"));

        let app = fs::read_to_string(page_dir.join("App.js")).unwrap();
        assert!(app.contains("Hello from home!"));
        assert!(app.contains("export default function App()"));
    }

    #[test]
    fn test_init_page_existing_dir_fails() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("home")).unwrap();

        let result = init_page(temp.path(), "home");
        assert!(matches!(result, Err(ScaffoldError::DirectoryExists(_))));
    }

    #[test]
    fn test_init_page_is_discoverable() {
        let temp = TempDir::new().unwrap();
        init_page(temp.path(), "home").unwrap();

        let entries = crate::discovery::discover_entries(temp.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].ends_with("home/index.js"));
    }
}
