use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CodecVariant;

/// Rejections returned by `Orchestrator::start` before any worker exists.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("both input and output folders must be set")]
    MissingPaths,
    #[error("a decompression run is already in progress")]
    Busy,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Failures while enumerating the input tree. These abort the whole run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("input root {} is not a readable directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("cannot enumerate {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("absolute paths are not allowed: {}", .0.display())]
    Absolute(PathBuf),
    #[error("parent traversal not allowed: {}", .0.display())]
    ParentTraversal(PathBuf),
    #[error("{} is not under {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),
}

/// Per-file failures. Counted and reported, never propagated past the runner.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is {len} bytes, shorter than the {needed}-byte {variant} header", path.display())]
    HeaderTooShort { path: PathBuf, variant: CodecVariant, len: usize, needed: usize },
    #[error("{} declares {declared} decompressed bytes, above the {limit}-byte limit", path.display())]
    OutputTooLarge { path: PathBuf, declared: u64, limit: u64 },
    #[error("{variant} decompressor rejected {}", path.display())]
    Decode { path: PathBuf, variant: CodecVariant },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Whole-run failures surfaced through `RunHandle::wait`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Start(#[from] StartError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("worker thread panicked")]
    WorkerPanicked,
}
