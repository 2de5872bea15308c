use std::fs;

use tracing::{debug, warn};

use crate::catalog::FileJob;
use crate::codec::{CodecAdapter, WorkBuffer};
use crate::error::JobError;
use crate::report::FileReport;

/// Runs jobs one after another against a single shared work buffer.
pub struct JobRunner<'a> {
    adapter: CodecAdapter<'a>,
}

impl<'a> JobRunner<'a> {
    pub fn new(adapter: CodecAdapter<'a>) -> Self {
        Self { adapter }
    }

    /// Process every job in order. A failed job is reported and skipped;
    /// `on_progress` sees each report right after its job finishes.
    pub fn run<I, F>(&self, jobs: I, work: &mut WorkBuffer, mut on_progress: F) -> Vec<FileReport>
    where
        I: IntoIterator<Item = FileJob>,
        F: FnMut(&FileReport),
    {
        let jobs = jobs.into_iter();
        let mut reports = Vec::with_capacity(jobs.size_hint().0);
        for job in jobs {
            let report = match self.run_one(&job, work) {
                Ok(data) => {
                    debug!(src = %job.source.display(), bytes = data.len(), "decompressed");
                    FileReport::written(&job, &data)
                }
                Err(e) => {
                    warn!(src = %job.source.display(), error = %e, "job failed");
                    FileReport::failed(&job, &e)
                }
            };
            on_progress(&report);
            reports.push(report);
        }
        reports
    }

    /// Decode one job and write its output, overwriting any existing file.
    /// Returns the bytes written.
    pub fn run_one(&self, job: &FileJob, work: &mut WorkBuffer) -> Result<Vec<u8>, JobError> {
        fs::create_dir_all(&job.dest_dir)
            .map_err(|source| JobError::Write { path: job.dest_dir.clone(), source })?;
        let data = self.adapter.decode(job, work)?;
        let dest = job.dest_path();
        fs::write(&dest, &data).map_err(|source| JobError::Write { path: dest, source })?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecVariant, DecodeLimits, DecompressBackend};
    use std::path::Path;

    /// Output = input payload after the chunk header, or failure if it starts with 0xFF.
    struct Passthrough;

    impl DecompressBackend for Passthrough {
        fn decompress_general(&self, _o: &mut [u8], _i: &[u8], _w: &mut [u8]) -> bool {
            false
        }
        fn decompress_chunk(&self, output: &mut [u8], input: &[u8], _w: &mut [u8]) -> bool {
            let payload = &input[4..];
            if payload.first() == Some(&0xFF) || payload.len() != output.len() {
                return false;
            }
            output.copy_from_slice(payload);
            true
        }
    }

    fn chunk_file(dir: &Path, name: &str, payload: &[u8]) -> FileJob {
        let source = dir.join(format!("{name}.chunk"));
        let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(payload);
        fs::write(&source, bytes).unwrap();
        FileJob {
            source,
            variant: CodecVariant::ChunkArchive,
            dest_dir: dir.join("out/nested"),
            dest_name: name.into(),
        }
    }

    #[test]
    fn bad_file_does_not_stop_batch() {
        let td = tempfile::tempdir().unwrap();
        let jobs = vec![
            chunk_file(td.path(), "a", b"alpha"),
            chunk_file(td.path(), "bad", &[0xFF, 1, 2]),
            chunk_file(td.path(), "c", b"gamma"),
        ];
        let runner = JobRunner::new(CodecAdapter::new(&Passthrough, DecodeLimits::default()));
        let mut work = WorkBuffer::new(16);
        let mut seen = Vec::new();
        let reports = runner.run(jobs, &mut work, |r| seen.push(r.is_ok()));

        assert_eq!(seen, [true, false, true]);
        assert_eq!(reports.len(), 3);
        assert_eq!(fs::read(td.path().join("out/nested/a")).unwrap(), b"alpha");
        assert_eq!(fs::read(td.path().join("out/nested/c")).unwrap(), b"gamma");
        assert!(!td.path().join("out/nested/bad").exists());
        assert!(reports[1].error.as_deref().unwrap().contains("rejected"));
    }

    #[test]
    fn existing_output_is_overwritten() {
        let td = tempfile::tempdir().unwrap();
        let job = chunk_file(td.path(), "a", b"new");
        fs::create_dir_all(&job.dest_dir).unwrap();
        fs::write(job.dest_path(), b"old contents that are longer").unwrap();

        let runner = JobRunner::new(CodecAdapter::new(&Passthrough, DecodeLimits::default()));
        runner.run_one(&job, &mut WorkBuffer::new(16)).unwrap();
        assert_eq!(fs::read(job.dest_path()).unwrap(), b"new");
    }

    #[test]
    fn unreadable_source_is_a_read_error() {
        let td = tempfile::tempdir().unwrap();
        let job = FileJob {
            source: td.path().join("gone.chunk"),
            variant: CodecVariant::ChunkArchive,
            dest_dir: td.path().join("out"),
            dest_name: "gone".into(),
        };
        let runner = JobRunner::new(CodecAdapter::new(&Passthrough, DecodeLimits::default()));
        let err = runner.run_one(&job, &mut WorkBuffer::new(16)).unwrap_err();
        assert!(matches!(err, JobError::Read { .. }));
    }

    #[test]
    fn blocked_destination_is_a_write_error() {
        let td = tempfile::tempdir().unwrap();
        let mut job = chunk_file(td.path(), "a", b"x");
        // a regular file where the output directory should be
        let blocker = td.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        job.dest_dir = blocker.join("sub");
        let runner = JobRunner::new(CodecAdapter::new(&Passthrough, DecodeLimits::default()));
        let err = runner.run_one(&job, &mut WorkBuffer::new(16)).unwrap_err();
        assert!(matches!(err, JobError::Write { .. }));
    }
}
