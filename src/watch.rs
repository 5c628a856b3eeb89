//! File watching for watch-mode jobs
//!
//! One debounced watcher covers every watched job in a batch; change
//! events are routed back to jobs by their registered source directories
//! and drained by the dispatch loop between handle polls.

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;

/// Error during watch setup or event delivery
#[derive(Debug)]
pub enum WatchError {
    /// Failed to initialize file watcher
    WatcherInit(notify::Error),
    /// Failed to add watch path
    WatchPath(notify::Error),
    /// The event channel died while jobs were still watched
    ChannelClosed(String),
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchError::WatcherInit(e) => write!(f, "Failed to initialize file watcher: {}", e),
            WatchError::WatchPath(e) => write!(f, "Failed to watch path: {}", e),
            WatchError::ChannelClosed(msg) => write!(f, "Watch channel closed: {}", msg),
        }
    }
}

impl std::error::Error for WatchError {}

/// A debounced set of changed paths attributed to one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    /// Position of the job in the submitted batch
    pub job: usize,
    /// Changed paths under that job's source directory
    pub paths: Vec<PathBuf>,
}

/// Source of change batches for the dispatch loop.
///
/// The production implementation is [`JobWatcher`]; tests drive the loop
/// with scripted sources.
pub trait ChangeSource {
    /// Wait up to `timeout` for changes. An empty vec means the timeout
    /// elapsed quietly; the call doubles as the loop's pacing sleep.
    fn poll_changes(&mut self, timeout: Duration) -> Result<Vec<ChangeBatch>, WatchError>;

    /// Whether any job directories are still being watched.
    fn is_armed(&self) -> bool;
}

/// Change source for batches with no watched jobs.
#[derive(Debug, Default)]
pub struct NeverChanges;

impl ChangeSource for NeverChanges {
    fn poll_changes(&mut self, timeout: Duration) -> Result<Vec<ChangeBatch>, WatchError> {
        std::thread::sleep(timeout);
        Ok(vec![])
    }

    fn is_armed(&self) -> bool {
        false
    }
}

/// Watches the source directories of every watch-mode job in a batch.
pub struct JobWatcher {
    debouncer: Debouncer<RecommendedWatcher>,
    rx: Receiver<notify_debouncer_mini::DebounceEventResult>,
    routes: Vec<(usize, PathBuf)>,
}

impl JobWatcher {
    /// Create a watcher with the given debounce window.
    pub fn new(debounce: Duration) -> Result<Self, WatchError> {
        let (tx, rx) = channel();
        let debouncer = new_debouncer(debounce, tx).map_err(WatchError::WatcherInit)?;
        Ok(Self { debouncer, rx, routes: Vec::new() })
    }

    /// Register a job's source directory for recursive watching.
    pub fn watch(&mut self, job: usize, dir: &Path) -> Result<(), WatchError> {
        self.debouncer
            .watcher()
            .watch(dir, RecursiveMode::Recursive)
            .map_err(WatchError::WatchPath)?;
        self.routes.push((job, dir.to_path_buf()));
        Ok(())
    }

    /// Number of registered jobs.
    pub fn watched_jobs(&self) -> usize {
        self.routes.len()
    }
}

impl ChangeSource for JobWatcher {
    fn poll_changes(&mut self, timeout: Duration) -> Result<Vec<ChangeBatch>, WatchError> {
        match self.rx.recv_timeout(timeout) {
            Ok(Ok(events)) => {
                let paths: Vec<PathBuf> = events
                    .iter()
                    .filter(|e| {
                        matches!(e.kind, DebouncedEventKind::Any) && is_relevant_path(&e.path)
                    })
                    .map(|e| e.path.clone())
                    .collect();
                Ok(route_paths(&self.routes, &paths))
            }
            Ok(Err(error)) => {
                // Watch error (non-fatal) - keep watching
                eprintln!("Watch error: {:?}", error);
                Ok(vec![])
            }
            Err(RecvTimeoutError::Timeout) => Ok(vec![]),
            Err(RecvTimeoutError::Disconnected) => Err(WatchError::ChannelClosed(
                "watcher event channel disconnected".to_string(),
            )),
        }
    }

    fn is_armed(&self) -> bool {
        !self.routes.is_empty()
    }
}

/// Attribute changed paths to jobs by watch-root prefix.
///
/// A path under two registered roots lands in both batches; each page
/// watching a shared file rebuilds, matching per-page bundler watching.
fn route_paths(routes: &[(usize, PathBuf)], paths: &[PathBuf]) -> Vec<ChangeBatch> {
    let mut batches = Vec::new();
    for (job, root) in routes {
        let matching: Vec<PathBuf> =
            paths.iter().filter(|p| p.starts_with(root)).cloned().collect();
        if !matching.is_empty() {
            batches.push(ChangeBatch { job: *job, paths: matching });
        }
    }
    batches
}

/// Check if a changed path should trigger a rebuild.
///
/// Hidden files, anything under node_modules, and editor backup files
/// are ignored; everything else under a page's source tree counts.
fn is_relevant_path(path: &Path) -> bool {
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name == "node_modules" {
            return false;
        }
        if name.len() > 1 && name.starts_with('.') && name != ".." {
            return false;
        }
    }
    !path.to_string_lossy().ends_with('~')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_relevant_path() {
        assert!(is_relevant_path(Path::new("/proj/pages/home/index.js")));
        assert!(is_relevant_path(Path::new("/proj/pages/home/style.scss")));
        assert!(is_relevant_path(Path::new("/proj/pages/home/logo.png")));
        assert!(!is_relevant_path(Path::new("/proj/node_modules/react/index.js")));
        assert!(!is_relevant_path(Path::new("/proj/pages/.cache/data")));
        assert!(!is_relevant_path(Path::new("/proj/pages/home/.env")));
        assert!(!is_relevant_path(Path::new("/proj/pages/home/index.js~")));
    }

    #[test]
    fn test_route_paths_by_prefix() {
        let routes = vec![
            (0, PathBuf::from("/proj/pages/home")),
            (1, PathBuf::from("/proj/pages/about")),
        ];
        let paths = vec![
            PathBuf::from("/proj/pages/home/index.js"),
            PathBuf::from("/proj/pages/home/app.js"),
            PathBuf::from("/proj/pages/other/index.js"),
        ];

        let batches = route_paths(&routes, &paths);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].job, 0);
        assert_eq!(batches[0].paths.len(), 2);
    }

    #[test]
    fn test_route_paths_shared_file_hits_both_jobs() {
        let routes =
            vec![(0, PathBuf::from("/proj/pages")), (1, PathBuf::from("/proj/pages/home"))];
        let paths = vec![PathBuf::from("/proj/pages/home/index.js")];

        let batches = route_paths(&routes, &paths);
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_never_changes() {
        let mut source = NeverChanges;
        assert!(!source.is_armed());
        let changes = source.poll_changes(Duration::from_millis(1)).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_watcher_reports_file_change() {
        let temp = TempDir::new().unwrap();
        let page_dir = temp.path().join("home");
        std::fs::create_dir_all(&page_dir).unwrap();

        let mut watcher = JobWatcher::new(Duration::from_millis(50)).unwrap();
        watcher.watch(0, &page_dir).unwrap();
        assert!(watcher.is_armed());
        assert_eq!(watcher.watched_jobs(), 1);

        std::fs::write(page_dir.join("index.js"), "export default 1;").unwrap();

        let mut seen = Vec::new();
        for _ in 0..40 {
            let batches = watcher.poll_changes(Duration::from_millis(100)).unwrap();
            if !batches.is_empty() {
                seen = batches;
                break;
            }
        }

        assert!(!seen.is_empty(), "expected a change batch for the written file");
        assert_eq!(seen[0].job, 0);
        assert!(seen[0].paths.iter().any(|p| p.ends_with("index.js")));
    }

    #[test]
    fn test_watch_missing_dir_fails() {
        let mut watcher = JobWatcher::new(Duration::from_millis(50)).unwrap();
        let result = watcher.watch(0, Path::new("/nonexistent/pagepack/watch/dir"));
        assert!(matches!(result, Err(WatchError::WatchPath(_))));
        assert!(!watcher.is_armed());
    }
}
