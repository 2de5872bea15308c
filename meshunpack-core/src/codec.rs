use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::catalog::FileJob;
use crate::error::JobError;
use crate::header;

/// Scratch capacity handed to the external decompressor (256 MiB).
pub const DEFAULT_WORK_BUFFER_CAPACITY: usize = 0x1000_0000;

/// The two recognised archive kinds, keyed by exact file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodecVariant {
    GeneralArchive,
    ChunkArchive,
}

impl CodecVariant {
    pub const ALL: [CodecVariant; 2] = [CodecVariant::GeneralArchive, CodecVariant::ChunkArchive];

    /// Extension without the dot. Matching is case-sensitive.
    pub fn extension(self) -> &'static str {
        match self {
            CodecVariant::GeneralArchive => "mc",
            CodecVariant::ChunkArchive => "chunk",
        }
    }

    pub fn from_extension(ext: &OsStr) -> Option<Self> {
        Self::ALL.into_iter().find(|v| ext == OsStr::new(v.extension()))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(Self::from_extension)
    }
}

impl fmt::Display for CodecVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CodecVariant::GeneralArchive => "mc",
            CodecVariant::ChunkArchive => "chunk",
        })
    }
}

/// The external decompress entry points, one per variant.
///
/// Each call receives the exact-size output slice, the whole input file and
/// the shared scratch buffer, and returns `false` on any decode failure. No
/// guarantee is made about `output` contents after a failure. Implementations
/// are not required to be reentrant: the runner calls them from one thread.
pub trait DecompressBackend: Send + Sync {
    fn decompress_general(&self, output: &mut [u8], input: &[u8], work: &mut [u8]) -> bool;
    fn decompress_chunk(&self, output: &mut [u8], input: &[u8], work: &mut [u8]) -> bool;
}

/// One scratch allocation shared by every job of a session.
pub struct WorkBuffer {
    buf: Vec<u8>,
}

impl WorkBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { buf: vec![0u8; capacity] }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl fmt::Debug for WorkBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkBuffer").field("capacity", &self.buf.len()).finish()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DecodeLimits {
    /// Largest output a header may declare before the file is rejected.
    pub max_output_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self { max_output_bytes: 4 * 1024 * 1024 * 1024 }
    }
}

/// Dispatches a `FileJob` to the backend function for its variant.
pub struct CodecAdapter<'a> {
    backend: &'a dyn DecompressBackend,
    limits: DecodeLimits,
}

impl<'a> CodecAdapter<'a> {
    pub fn new(backend: &'a dyn DecompressBackend, limits: DecodeLimits) -> Self {
        Self { backend, limits }
    }

    /// Read, size-check and decompress one job's source file.
    pub fn decode(&self, job: &FileJob, work: &mut WorkBuffer) -> Result<Vec<u8>, JobError> {
        let input = std::fs::read(&job.source)
            .map_err(|source| JobError::Read { path: job.source.clone(), source })?;
        self.decode_bytes(job, &input, work)
    }

    /// Decode already-loaded `input` as `job`'s variant.
    pub fn decode_bytes(
        &self,
        job: &FileJob,
        input: &[u8],
        work: &mut WorkBuffer,
    ) -> Result<Vec<u8>, JobError> {
        let variant = job.variant;
        let hdr = header::parse(variant, input).ok_or_else(|| JobError::HeaderTooShort {
            path: job.source.clone(),
            variant,
            len: input.len(),
            needed: header::header_len(variant),
        })?;
        let too_large = || JobError::OutputTooLarge {
            path: job.source.clone(),
            declared: hdr.decompressed_size,
            limit: self.limits.max_output_bytes,
        };
        if hdr.decompressed_size > self.limits.max_output_bytes {
            return Err(too_large());
        }
        let size = usize::try_from(hdr.decompressed_size).map_err(|_| too_large())?;

        let mut output = vec![0u8; size];
        let work = work.as_mut_slice();
        let ok = match variant {
            CodecVariant::GeneralArchive => self.backend.decompress_general(&mut output, input, work),
            CodecVariant::ChunkArchive => self.backend.decompress_chunk(&mut output, input, work),
        };
        if ok {
            Ok(output)
        } else {
            Err(JobError::Decode { path: job.source.clone(), variant })
        }
    }
}
