use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::info;

use crate::catalog::{self, CatalogOptions};
use crate::codec::{CodecAdapter, DecodeLimits, DecompressBackend, WorkBuffer, DEFAULT_WORK_BUFFER_CAPACITY};
use crate::error::{RunError, StartError};
use crate::localize::{FluentLoc, Status, DEFAULT_LANG};
use crate::progress::{ProgressState, Snapshot};
use crate::report::{now_utc, RunSummary};
use crate::runner::JobRunner;

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Scratch bytes handed to every decompress call.
    pub work_buffer_capacity: usize,
    pub limits: DecodeLimits,
    pub catalog: CatalogOptions,
    /// Language tag for status text.
    pub lang: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            work_buffer_capacity: DEFAULT_WORK_BUFFER_CAPACITY,
            limits: DecodeLimits::default(),
            catalog: CatalogOptions::default(),
            lang: DEFAULT_LANG.to_string(),
        }
    }
}

/// Owns the shared progress record and starts at most one worker at a time.
///
/// ```text
/// Idle/Completed/Failed --start--> Scanning --N>0--> Running --> Completed
///                                   |   \--N=0--> Completed
///                                   \--scan error--> Failed
/// ```
pub struct Orchestrator {
    backend: Arc<dyn DecompressBackend>,
    config: SessionConfig,
    progress: ProgressState,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn DecompressBackend>, config: SessionConfig) -> Self {
        let ready = FluentLoc::builtin(&config.lang).status(&Status::Ready);
        Self { backend, config, progress: ProgressState::new(ready) }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Snapshot {
        self.progress.snapshot()
    }

    /// Handle for observers that outlive a borrow of the orchestrator.
    pub fn progress(&self) -> ProgressState {
        self.progress.clone()
    }

    /// Validate both roots and launch the worker for one session.
    pub fn start(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<RunHandle, StartError> {
        let (input, output) = (input.as_ref(), output.as_ref());
        let loc = FluentLoc::builtin(&self.config.lang);

        if input.as_os_str().is_empty() || output.as_os_str().is_empty() {
            if !self.progress.try_set_status(loc.status(&Status::MissingPaths)) {
                return Err(StartError::Busy);
            }
            return Err(StartError::MissingPaths);
        }
        if !self.progress.try_begin(loc.status(&Status::Scanning)) {
            return Err(StartError::Busy);
        }

        let worker = Worker {
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
            progress: self.progress.clone(),
            input_root: input.to_path_buf(),
            output_root: output.to_path_buf(),
        };
        let spawned = thread::Builder::new()
            .name("meshunpack-worker".into())
            .spawn(move || worker.run());
        match spawned {
            Ok(handle) => Ok(RunHandle { handle }),
            Err(e) => {
                self.progress.fail(loc.status(&Status::SpawnFailed(&e.to_string())));
                Err(StartError::Spawn(e))
            }
        }
    }

    /// `start` followed by `wait`.
    pub fn run_blocking(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<RunSummary, RunError> {
        self.start(input, output)?.wait()
    }
}

/// Join handle for one session's worker thread.
#[derive(Debug)]
pub struct RunHandle {
    handle: JoinHandle<Result<RunSummary, RunError>>,
}

impl RunHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn wait(self) -> Result<RunSummary, RunError> {
        self.handle.join().unwrap_or(Err(RunError::WorkerPanicked))
    }
}

struct Worker {
    backend: Arc<dyn DecompressBackend>,
    config: SessionConfig,
    progress: ProgressState,
    input_root: PathBuf,
    output_root: PathBuf,
}

impl Worker {
    fn run(self) -> Result<RunSummary, RunError> {
        let loc = FluentLoc::builtin(&self.config.lang);
        let _guard = PanicGuard { progress: &self.progress, status: loc.status(&Status::WorkerPanicked) };
        let started_utc = now_utc();
        info!(input = %self.input_root.display(), output = %self.output_root.display(), "run started");

        let catalog = match catalog::scan(&self.input_root, &self.output_root, &self.config.catalog) {
            Ok(c) => c,
            Err(e) => {
                self.progress.fail(loc.status(&Status::ScanError(&e.to_string())));
                return Err(e.into());
            }
        };

        let mut summary = RunSummary {
            input_root: self.input_root.clone(),
            output_root: self.output_root.clone(),
            started_utc,
            finished_utc: String::new(),
            total: catalog.len() as u64,
            success: 0,
            failure: 0,
            files: Vec::new(),
        };

        if catalog.is_empty() {
            self.progress.complete(loc.status(&Status::NoFiles));
            summary.finished_utc = now_utc();
            info!("no matching files");
            return Ok(summary);
        }

        let total = summary.total;
        self.progress.begin_running(total, loc.status(&Status::Processing { processed: 0, total }));

        let mut work = WorkBuffer::new(self.config.work_buffer_capacity);
        let runner = JobRunner::new(CodecAdapter::new(self.backend.as_ref(), self.config.limits));
        summary.files = runner.run(catalog.into_jobs(), &mut work, |report| {
            self.progress.record_outcome(report.is_ok(), |s| {
                loc.status(&Status::Processing { processed: s.processed, total: s.total })
            });
        });
        drop(work);

        summary.success = summary.files.iter().filter(|f| f.is_ok()).count() as u64;
        summary.failure = total - summary.success;
        summary.finished_utc = now_utc();
        self.progress
            .complete(loc.status(&Status::Complete { success: summary.success, failed: summary.failure }));
        info!(total, success = summary.success, failure = summary.failure, "run complete");
        Ok(summary)
    }
}

/// Marks the session failed if the worker unwinds, so the record never stays busy.
struct PanicGuard<'a> {
    progress: &'a ProgressState,
    status: String,
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.progress.fail(std::mem::take(&mut self.status));
        }
    }
}
