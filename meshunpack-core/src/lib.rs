pub mod catalog;
pub mod codec;
pub mod error;
pub mod header;
pub mod layout;
pub mod localize;
pub mod native;
pub mod orchestrator;
pub mod progress;
pub mod report;
pub mod runner;

pub use catalog::{scan, Catalog, CatalogOptions, FileJob, ScanFilter};
pub use codec::{CodecAdapter, CodecVariant, DecodeLimits, DecompressBackend, WorkBuffer};
pub use error::{JobError, RunError, ScanError, StartError};
pub use native::NativeBackend;
pub use orchestrator::{Orchestrator, RunHandle, SessionConfig};
pub use progress::{Phase, Snapshot};
pub use report::{FileReport, RunSummary};
