//! Build job dispatch orchestration.
//!
//! The dispatcher validates a batch, selects the governing build mode,
//! submits every job to the bundler up front, then drives a single
//! cooperative loop that polls compile handles and drains file change
//! batches until the run settles (or forever, in watch mode).

use crate::bundler::{
    BuildMode, BuildOutcome, BundleConfig, Bundler, BundlerError, CompileHandle, ConfigBuilder,
    DevelopmentBuilder, ProductionBuilder, StatsDetail,
};
use crate::dispatch::{DispatchSummary, JobRecord, JobState};
use crate::job::{self, ConfigurationError, JobDescriptor};
use crate::status::{StatusEvent, StatusSink};
use crate::watch::{ChangeSource, JobWatcher, NeverChanges, WatchError};
use std::time::{Duration, Instant};

/// Error during dispatch.
#[derive(Debug)]
pub enum DispatchError {
    /// Bad job descriptors; reported before anything runs
    Configuration(ConfigurationError),
    /// The bundler tool itself broke; the run is aborted
    Bundler(BundlerError),
    /// File watching broke while jobs were armed
    Watch(WatchError),
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::Configuration(e) => write!(f, "Configuration error: {}", e),
            DispatchError::Bundler(e) => write!(f, "Bundler error: {}", e),
            DispatchError::Watch(e) => write!(f, "Watch error: {}", e),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<ConfigurationError> for DispatchError {
    fn from(e: ConfigurationError) -> Self {
        DispatchError::Configuration(e)
    }
}

impl From<BundlerError> for DispatchError {
    fn from(e: BundlerError) -> Self {
        DispatchError::Bundler(e)
    }
}

impl From<WatchError> for DispatchError {
    fn from(e: WatchError) -> Self {
        DispatchError::Watch(e)
    }
}

/// Book-keeping for one submitted job.
struct JobSlot {
    page: String,
    complete_msg: Option<String>,
    config: BundleConfig,
    handle: Option<Box<dyn CompileHandle>>,
    state: JobState,
    compiles: usize,
    /// Outcome of the first compile, once known
    first_success: Option<bool>,
    /// Changed-path count that arrived while a compile was in flight
    pending_change: Option<usize>,
}

/// Dispatches batches of build jobs to a bundler.
pub struct Dispatcher {
    bundler: Box<dyn Bundler>,
    sink: Box<dyn StatusSink>,
    dev_builder: Box<dyn ConfigBuilder>,
    prod_builder: Box<dyn ConfigBuilder>,
    debounce: Duration,
    poll_interval: Duration,
}

impl Dispatcher {
    /// Create a dispatcher with default dev and deploy config builders.
    pub fn new(bundler: Box<dyn Bundler>, sink: Box<dyn StatusSink>) -> Self {
        Self {
            bundler,
            sink,
            dev_builder: Box::new(DevelopmentBuilder::new()),
            prod_builder: Box::new(ProductionBuilder::new()),
            debounce: Duration::from_millis(100),
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Replace the dev and deploy config builders.
    pub fn with_builders(
        mut self,
        dev: Box<dyn ConfigBuilder>,
        prod: Box<dyn ConfigBuilder>,
    ) -> Self {
        self.dev_builder = dev;
        self.prod_builder = prod;
        self
    }

    /// Set the file-watch debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the cooperative loop's poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run a batch to completion.
    ///
    /// Watch-mode jobs keep the run alive after the first pass; the
    /// summary is only returned once every watcher has disarmed, which
    /// for a real watcher means never (the process is interrupted).
    pub fn run(&self, jobs: &[JobDescriptor]) -> Result<DispatchSummary, DispatchError> {
        let watched: Vec<usize> =
            jobs.iter().enumerate().filter(|(_, j)| j.watch).map(|(i, _)| i).collect();

        if watched.is_empty() {
            let mut source = NeverChanges;
            self.run_with_source(jobs, &mut source)
        } else {
            let mut watcher = JobWatcher::new(self.debounce)?;
            for index in watched {
                watcher.watch(index, &jobs[index].src_dir)?;
            }
            self.run_with_source(jobs, &mut watcher)
        }
    }

    /// Run a batch against an explicit change source.
    pub fn run_with_source(
        &self,
        jobs: &[JobDescriptor],
        changes: &mut dyn ChangeSource,
    ) -> Result<DispatchSummary, DispatchError> {
        if jobs.is_empty() {
            return Ok(DispatchSummary::new());
        }

        // Configuration errors are fatal before any job is submitted.
        job::validate_batch(jobs)?;

        let start = Instant::now();
        let mode = BuildMode::from_deploy(jobs[0].deploy);
        let stats = StatsDetail::from_verbose(jobs[0].verbose);
        let builder: &dyn ConfigBuilder =
            if mode.is_production() { self.prod_builder.as_ref() } else { self.dev_builder.as_ref() };

        self.sink.report(StatusEvent::BatchStarted { jobs: jobs.len(), mode });

        // Fire-and-forget submission: every job starts before any result
        // is read back.
        let mut slots: Vec<JobSlot> = Vec::with_capacity(jobs.len());
        for job in jobs {
            let page = job.display_name();
            let config = builder.build(job, stats);
            self.sink.report(StatusEvent::JobStarted {
                page: page.clone(),
                message: job.start_msg.clone(),
            });
            self.sink.report(StatusEvent::Progress { page: page.clone(), percent: 0 });

            let handle = match self.bundler.start(&config) {
                Ok(handle) => handle,
                Err(e) => {
                    abort_all(&mut slots);
                    self.sink.finish();
                    return Err(DispatchError::Bundler(e));
                }
            };

            slots.push(JobSlot {
                page,
                complete_msg: job.complete_msg.clone(),
                config,
                handle: Some(handle),
                state: JobState::Compiling,
                compiles: 1,
                first_success: None,
                pending_change: None,
            });
        }

        let mut first_pass_reported = false;
        let mut watching_reported = false;

        loop {
            // Drain file changes; the timeout paces the whole loop.
            let batches = match changes.poll_changes(self.poll_interval) {
                Ok(batches) => batches,
                Err(e) => {
                    abort_all(&mut slots);
                    self.sink.finish();
                    return Err(DispatchError::Watch(e));
                }
            };
            for batch in batches {
                if batch.job >= slots.len() {
                    continue;
                }
                let changed = batch.paths.len();
                if slots[batch.job].handle.is_some() {
                    // Mid-compile change; rebuild as soon as this one lands
                    let slot = &mut slots[batch.job];
                    slot.pending_change = Some(slot.pending_change.unwrap_or(0) + changed);
                } else {
                    let restarted = self.restart(&mut slots[batch.job], changed);
                    if let Err(e) = restarted {
                        abort_all(&mut slots);
                        self.sink.finish();
                        return Err(e);
                    }
                }
            }

            // Poll in-flight compiles.
            for i in 0..slots.len() {
                let Some(mut handle) = slots[i].handle.take() else { continue };
                let polled = handle.poll();
                let pending = match polled {
                    Ok(None) => {
                        slots[i].handle = Some(handle);
                        continue;
                    }
                    Ok(Some(outcome)) => {
                        let slot = &mut slots[i];
                        match outcome {
                            BuildOutcome::Success(stats) => {
                                slot.state = JobState::Succeeded;
                                if slot.first_success.is_none() {
                                    slot.first_success = Some(true);
                                }
                                self.sink.report(StatusEvent::JobSucceeded {
                                    page: slot.page.clone(),
                                    message: slot.complete_msg.clone(),
                                    stats,
                                });
                            }
                            BuildOutcome::Failed(failure) => {
                                slot.state = JobState::Failed;
                                if slot.first_success.is_none() {
                                    slot.first_success = Some(false);
                                }
                                self.sink.report(StatusEvent::JobFailed {
                                    page: slot.page.clone(),
                                    failure,
                                });
                            }
                        }
                        slot.pending_change.take()
                    }
                    Err(e) => {
                        abort_all(&mut slots);
                        self.sink.finish();
                        return Err(DispatchError::Bundler(e));
                    }
                };

                if let Some(changed) = pending {
                    let restarted = self.restart(&mut slots[i], changed);
                    if let Err(e) = restarted {
                        abort_all(&mut slots);
                        self.sink.finish();
                        return Err(e);
                    }
                }
            }

            if !first_pass_reported && slots.iter().all(|s| s.first_success.is_some()) {
                first_pass_reported = true;
                let succeeded = slots.iter().filter(|s| s.first_success == Some(true)).count();
                self.sink.report(StatusEvent::BatchFinished {
                    succeeded,
                    failed: slots.len() - succeeded,
                    duration_ms: start.elapsed().as_millis() as u64,
                });
                if changes.is_armed() && !watching_reported {
                    watching_reported = true;
                    self.sink.report(StatusEvent::Watching {
                        pages: jobs.iter().filter(|j| j.watch).count(),
                    });
                }
            }

            let all_idle = slots.iter().all(|s| s.handle.is_none());
            if first_pass_reported && all_idle && !changes.is_armed() {
                break;
            }
        }

        self.sink.finish();

        let mut summary = DispatchSummary::new();
        for slot in slots {
            summary.record(JobRecord {
                page: slot.page,
                state: slot.state,
                compiles: slot.compiles,
            });
        }
        summary.total_duration = start.elapsed();
        Ok(summary)
    }

    /// Resubmit a watched job after its sources changed.
    fn restart(&self, slot: &mut JobSlot, changed: usize) -> Result<(), DispatchError> {
        self.sink.report(StatusEvent::Recompiling { page: slot.page.clone(), changed });
        self.sink.report(StatusEvent::Progress { page: slot.page.clone(), percent: 0 });
        let handle = self.bundler.start(&slot.config)?;
        slot.handle = Some(handle);
        slot.state = JobState::Compiling;
        slot.compiles += 1;
        Ok(())
    }
}

/// Cancel every in-flight compile.
fn abort_all(slots: &mut [JobSlot]) {
    for slot in slots {
        if let Some(mut handle) = slot.handle.take() {
            handle.cancel();
        }
    }
}
