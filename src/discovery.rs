//! Page discovery for the dispatch commands.
//!
//! Resolves a source argument into page entry files, maps every page to
//! its destination, public, and template paths, and assembles the job
//! descriptors the dispatcher consumes. Command-line dispatch bypasses
//! this module entirely; it exists for the project-layout commands.

use glob::glob;
use std::fs;
use std::path::{Path, PathBuf};

use crate::job::JobDescriptor;

/// Asset files carried from the public directory into the bundle output.
const SAFE_ASSETS: [&str; 2] = ["favicon.ico", "manifest.json"];

/// Error during page discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// No page entry files under the source directory
    NoPages(PathBuf),
    /// A destination path exists but is not a directory
    NotADirectory(PathBuf),
    /// Invalid glob pattern
    InvalidPattern(String, glob::PatternError),
    /// IO error during file enumeration
    Io(std::io::Error),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::NoPages(dir) => {
                write!(f, "No pages found under '{}'", dir.display())
            }
            DiscoveryError::NotADirectory(path) => {
                write!(f, "Destination exists but is not a directory: '{}'", path.display())
            }
            DiscoveryError::InvalidPattern(pattern, err) => {
                write!(f, "Invalid glob pattern '{}': {}", pattern, err)
            }
            DiscoveryError::Io(err) => write!(f, "IO error during discovery: {}", err),
        }
    }
}

impl std::error::Error for DiscoveryError {}

impl From<std::io::Error> for DiscoveryError {
    fn from(err: std::io::Error) -> Self {
        DiscoveryError::Io(err)
    }
}

/// Filesystem context discovery resolves against.
///
/// The project directory is the npm prefix, the node_modules directory
/// is the npm root, and the fallback public directory ships with the
/// bundler runtime cache.
#[derive(Debug, Clone)]
pub struct ProjectEnv {
    project_dir: PathBuf,
    node_modules: PathBuf,
    fallback_public: PathBuf,
}

impl ProjectEnv {
    /// Create a discovery context.
    pub fn new(
        project_dir: impl Into<PathBuf>,
        node_modules: impl Into<PathBuf>,
        fallback_public: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            node_modules: node_modules.into(),
            fallback_public: fallback_public.into(),
        }
    }

    /// Project root directory.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// node_modules directory for module resolution.
    pub fn node_modules(&self) -> &Path {
        &self.node_modules
    }
}

/// Jobs assembled by a discovery pass, plus any notices to print.
#[derive(Debug)]
pub struct DiscoveredJobs {
    /// One descriptor per discovered page
    pub jobs: Vec<JobDescriptor>,
    /// Courtesy notices about fallback paths in use
    pub notices: Vec<String>,
}

/// Page discovery with run-shape knobs.
///
/// Knobs select how the assembled descriptors behave (watch, deploy,
/// verbose) and where pages and bundles live when the defaults do not
/// apply.
#[derive(Debug, Clone, Default)]
pub struct PageDiscovery {
    source: Option<PathBuf>,
    dest: Option<PathBuf>,
    static_url: Option<String>,
    watch: bool,
    deploy: bool,
    verbose: bool,
}

impl PageDiscovery {
    /// Create a discovery pass with default knobs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit source file or directory.
    pub fn with_source(mut self, source: Option<PathBuf>) -> Self {
        self.source = source;
        self
    }

    /// Set an explicit destination base directory.
    pub fn with_dest(mut self, dest: Option<PathBuf>) -> Self {
        self.dest = dest;
        self
    }

    /// Set the public URL pattern. `{page name}` is substituted per page.
    pub fn with_static_url(mut self, url: Option<String>) -> Self {
        self.static_url = url;
        self
    }

    /// Rebuild pages when their sources change.
    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Produce production bundles.
    pub fn with_deploy(mut self, deploy: bool) -> Self {
        self.deploy = deploy;
        self
    }

    /// Request the full stats report.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Discover pages and assemble their job descriptors.
    pub fn discover(&self, env: &ProjectEnv) -> Result<DiscoveredJobs, DiscoveryError> {
        let source = self.source.clone().unwrap_or_else(|| env.project_dir.clone());
        let entries = discover_entries(&source)?;
        if entries.is_empty() {
            return Err(DiscoveryError::NoPages(source));
        }

        let mut jobs = Vec::with_capacity(entries.len());
        let mut notices = Vec::new();

        for entry in entries {
            let page = page_name(&entry);
            let page_dir = entry.parent().unwrap_or(&source).to_path_buf();

            let dest_dir = resolve_dest_dir(self.dest.as_deref(), &page, &env.project_dir)?;
            let (public_dir, notice) =
                resolve_public_dir(&page_dir, &env.project_dir, &env.fallback_public);
            if let Some(notice) = notice {
                if !notices.contains(&notice) {
                    notices.push(notice);
                }
            }

            copy_files_safe(&public_dir, &dest_dir, &SAFE_ASSETS)?;

            let public_url = match &self.static_url {
                Some(url) => substitute_page_name(url, &page),
                None => ".".to_string(),
            };

            jobs.push(JobDescriptor {
                entry,
                dest_dir,
                src_dir: page_dir,
                npm_root: env.node_modules.clone(),
                html_template: public_dir.join("index.html"),
                watch: self.watch,
                verbose: self.verbose,
                deploy: self.deploy,
                page_name: page,
                start_msg: None,
                complete_msg: None,
                public_url,
                npm_prefix: Some(env.project_dir.clone()),
            });
        }

        Ok(DiscoveredJobs { jobs, notices })
    }
}

/// Resolve a source argument into page entry files.
///
/// A non-directory source is taken as the entry itself. A directory is
/// searched for its own `index.js`, then for `index.js` one level down,
/// one page per child directory.
pub fn discover_entries(source: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !source.is_dir() {
        return Ok(vec![source.to_path_buf()]);
    }

    let mut entries = entry_files(source, "index.js")?;
    if entries.is_empty() {
        entries = entry_files(source, "*/index.js")?;
    }
    Ok(entries)
}

/// Find entry files matching a glob pattern under a directory.
fn entry_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let full_pattern = base_dir.join(pattern);
    let pattern_str = full_pattern.to_string_lossy();

    let paths =
        glob(&pattern_str).map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => {
                // Log but continue on glob errors
                eprintln!("Warning: error reading path: {}", e);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Display name of the page an entry file belongs to.
pub fn page_name(entry: &Path) -> String {
    entry
        .parent()
        .and_then(Path::file_name)
        .or_else(|| entry.file_stem())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string())
}

/// Resolve and create the destination directory for one page.
///
/// The base defaults to `build` under the project directory; each page
/// gets its own subdirectory.
pub fn resolve_dest_dir(
    base: Option<&Path>,
    page: &str,
    project_dir: &Path,
) -> Result<PathBuf, DiscoveryError> {
    let base = match base {
        Some(base) => base.to_path_buf(),
        None => project_dir.join("build"),
    };

    let dest = base.join(page);
    if dest.exists() && !dest.is_dir() {
        return Err(DiscoveryError::NotADirectory(dest));
    }
    fs::create_dir_all(&dest)?;
    Ok(dest)
}

/// Resolve the public directory for one page.
///
/// Prefers the page's own `public`, then the project's, then the
/// runtime fallback. Using the fallback produces a notice telling the
/// user how to override the HTML template.
pub fn resolve_public_dir(
    page_dir: &Path,
    project_dir: &Path,
    fallback: &Path,
) -> (PathBuf, Option<String>) {
    let page_public = page_dir.join("public");
    if page_public.is_dir() {
        return (page_public, None);
    }

    let project_public = project_dir.join("public");
    if project_public.is_dir() {
        return (project_public, None);
    }

    let notice = format!(
        "Using the default HTML template. Create '{}' to override it.",
        page_public.join("index.html").display()
    );
    (fallback.to_path_buf(), Some(notice))
}

/// Copy named files between directories without overwriting.
///
/// Files absent from the source or already present in the destination
/// are skipped. Returns how many files were copied.
pub fn copy_files_safe(from: &Path, to: &Path, names: &[&str]) -> Result<usize, DiscoveryError> {
    let mut copied = 0;
    for name in names {
        let src = from.join(name);
        let dest = to.join(name);
        if src.is_file() && !dest.exists() {
            fs::copy(&src, &dest)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Substitute the page name into a public URL pattern.
pub fn substitute_page_name(url: &str, page: &str) -> String {
    url.replace("{page name}", page)
}
