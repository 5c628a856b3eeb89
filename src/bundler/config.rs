//! Bundle configuration assembly.
//!
//! Maps a [`JobDescriptor`] onto the concrete path set and mode knobs the
//! external bundler consumes. The dev and prod builders differ only in
//! the knobs; the path mapping is shared. The selected mode reaches the
//! bundler through its process environment (`NODE_ENV` / `BABEL_ENV`),
//! never through this process's own environment.

use serde::Serialize;
use std::path::PathBuf;

use crate::job::JobDescriptor;

/// Build mode selected by the governing deploy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Fast rebuilds, source maps, readable output
    Development,
    /// Minified, cache-busted output
    Production,
}

impl BuildMode {
    /// Mode for a deploy flag.
    pub fn from_deploy(deploy: bool) -> Self {
        if deploy {
            BuildMode::Production
        } else {
            BuildMode::Development
        }
    }

    /// Value the bundler expects in `NODE_ENV` and `BABEL_ENV`.
    pub fn as_env(&self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }

    /// Check if this is a production build.
    pub fn is_production(&self) -> bool {
        matches!(self, BuildMode::Production)
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_env())
    }
}

/// How much of the stats report the bundler should emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsDetail {
    /// Errors and their module trace only
    Condensed,
    /// Full report, chunk noise excluded
    Full,
}

impl StatsDetail {
    /// Detail level for a verbose flag.
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            StatsDetail::Full
        } else {
            StatsDetail::Condensed
        }
    }
}

/// Everything one compile needs, handed to the bundler as JSON.
///
/// The environment pairs and working directory travel beside the payload
/// rather than inside it; they apply to the bundler process itself.
#[derive(Debug, Clone, Serialize)]
pub struct BundleConfig {
    /// Source entry file
    pub entry: PathBuf,
    /// Output directory for emitted assets
    pub out_dir: PathBuf,
    /// Page source directory
    pub src_dir: PathBuf,
    /// HTML template the bundle is injected into
    pub html_template: PathBuf,
    /// node_modules directory for module resolution
    pub node_modules: PathBuf,
    /// Public URL prefix baked into asset references
    pub public_url: String,
    /// Display name of the page
    pub page_name: String,
    /// Selected build mode
    pub mode: BuildMode,
    /// Minify emitted assets
    pub minify: bool,
    /// Emit source maps
    pub source_maps: bool,
    /// Requested stats report detail
    pub stats: StatsDetail,
    /// Extra roots for style imports, from the project NODE_PATH
    pub style_paths: Vec<PathBuf>,
    /// Environment pairs for the bundler process only
    #[serde(skip)]
    pub env: Vec<(String, String)>,
    /// Directory the bundler process runs in
    #[serde(skip)]
    pub working_dir: PathBuf,
}

impl BundleConfig {
    /// Encode the payload for the bundler command line.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Builds bundle configurations for one mode.
pub trait ConfigBuilder {
    /// Mode this builder produces configurations for.
    fn mode(&self) -> BuildMode;

    /// Assemble the configuration for one job.
    fn build(&self, job: &JobDescriptor, stats: StatsDetail) -> BundleConfig;
}

/// Development configuration builder: source maps on, minification off.
#[derive(Debug, Clone, Default)]
pub struct DevelopmentBuilder {
    style_paths: Vec<PathBuf>,
}

impl DevelopmentBuilder {
    /// Create a development builder with no extra style roots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set style import roots threaded from the project NODE_PATH.
    pub fn with_style_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.style_paths = paths;
        self
    }
}

impl ConfigBuilder for DevelopmentBuilder {
    fn mode(&self) -> BuildMode {
        BuildMode::Development
    }

    fn build(&self, job: &JobDescriptor, stats: StatsDetail) -> BundleConfig {
        base_config(job, BuildMode::Development, stats, &self.style_paths)
    }
}

/// Production configuration builder: minification on, source maps off.
#[derive(Debug, Clone, Default)]
pub struct ProductionBuilder {
    style_paths: Vec<PathBuf>,
}

impl ProductionBuilder {
    /// Create a production builder with no extra style roots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set style import roots threaded from the project NODE_PATH.
    pub fn with_style_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.style_paths = paths;
        self
    }
}

impl ConfigBuilder for ProductionBuilder {
    fn mode(&self) -> BuildMode {
        BuildMode::Production
    }

    fn build(&self, job: &JobDescriptor, stats: StatsDetail) -> BundleConfig {
        base_config(job, BuildMode::Production, stats, &self.style_paths)
    }
}

/// Standard builder for a mode.
pub fn builder_for(mode: BuildMode, style_paths: Vec<PathBuf>) -> Box<dyn ConfigBuilder> {
    match mode {
        BuildMode::Development => Box::new(DevelopmentBuilder::new().with_style_paths(style_paths)),
        BuildMode::Production => Box::new(ProductionBuilder::new().with_style_paths(style_paths)),
    }
}

/// Shared descriptor-to-config path mapping.
fn base_config(
    job: &JobDescriptor,
    mode: BuildMode,
    stats: StatsDetail,
    style_paths: &[PathBuf],
) -> BundleConfig {
    BundleConfig {
        entry: job.entry.clone(),
        out_dir: job.dest_dir.clone(),
        src_dir: job.src_dir.clone(),
        html_template: job.html_template.clone(),
        node_modules: job.npm_root.clone(),
        public_url: job.public_url.clone(),
        page_name: job.display_name(),
        mode,
        minify: mode.is_production(),
        source_maps: !mode.is_production(),
        stats,
        style_paths: style_paths.to_vec(),
        env: vec![
            ("NODE_ENV".to_string(), mode.as_env().to_string()),
            ("BABEL_ENV".to_string(), mode.as_env().to_string()),
        ],
        working_dir: job.working_dir().to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobDescriptor {
        JobDescriptor::parse(
            r#"{
                "src path": "pages/home/index.js",
                "dest dir": "build/home",
                "watch": false,
                "npm root": "proj/node_modules",
                "src dir": "pages/home",
                "html template": "public/index.html",
                "public url": "/static/home"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_mode_from_deploy() {
        assert_eq!(BuildMode::from_deploy(true), BuildMode::Production);
        assert_eq!(BuildMode::from_deploy(false), BuildMode::Development);
        assert_eq!(BuildMode::Production.as_env(), "production");
        assert_eq!(BuildMode::Development.to_string(), "development");
    }

    #[test]
    fn test_development_config() {
        let builder = DevelopmentBuilder::new();
        let config = builder.build(&job(), StatsDetail::Condensed);

        assert_eq!(config.mode, BuildMode::Development);
        assert!(!config.minify);
        assert!(config.source_maps);
        assert_eq!(config.entry, PathBuf::from("pages/home/index.js"));
        assert_eq!(config.page_name, "home");
        assert_eq!(config.public_url, "/static/home");
        assert_eq!(config.working_dir, PathBuf::from("proj"));
    }

    #[test]
    fn test_production_config() {
        let builder = ProductionBuilder::new();
        let config = builder.build(&job(), StatsDetail::Full);

        assert_eq!(config.mode, BuildMode::Production);
        assert!(config.minify);
        assert!(!config.source_maps);
        assert_eq!(config.stats, StatsDetail::Full);
    }

    #[test]
    fn test_mode_env_pairs() {
        let config = ProductionBuilder::new().build(&job(), StatsDetail::Condensed);
        assert!(config
            .env
            .iter()
            .any(|(k, v)| k == "NODE_ENV" && v == "production"));
        assert!(config
            .env
            .iter()
            .any(|(k, v)| k == "BABEL_ENV" && v == "production"));
    }

    #[test]
    fn test_style_paths_threaded() {
        let builder =
            DevelopmentBuilder::new().with_style_paths(vec![PathBuf::from("pages/shared")]);
        let config = builder.build(&job(), StatsDetail::Condensed);
        assert_eq!(config.style_paths, vec![PathBuf::from("pages/shared")]);
    }

    #[test]
    fn test_builder_for_selects_mode() {
        assert_eq!(
            builder_for(BuildMode::Production, vec![]).mode(),
            BuildMode::Production
        );
        assert_eq!(
            builder_for(BuildMode::Development, vec![]).mode(),
            BuildMode::Development
        );
    }

    #[test]
    fn test_config_serializes_without_process_fields() {
        let config = DevelopmentBuilder::new().build(&job(), StatsDetail::Condensed);
        let json = config.to_json().unwrap();
        assert!(json.contains("\"mode\":\"development\""));
        assert!(json.contains("\"stats\":\"condensed\""));
        assert!(!json.contains("NODE_ENV"));
        assert!(!json.contains("working_dir"));
    }
}
