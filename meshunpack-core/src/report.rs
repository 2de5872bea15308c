use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::catalog::FileJob;
use crate::codec::CodecVariant;
use crate::error::JobError;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Failed,
}

#[derive(Serialize, Clone, Debug)]
pub struct FileReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub variant: CodecVariant,
    pub outcome: Outcome,
    pub bytes: Option<u64>,
    pub blake3_hex: Option<String>,
    pub error: Option<String>,
}

impl FileReport {
    pub fn written(job: &FileJob, data: &[u8]) -> Self {
        Self {
            source: job.source.clone(),
            destination: job.dest_path(),
            variant: job.variant,
            outcome: Outcome::Ok,
            bytes: Some(data.len() as u64),
            blake3_hex: Some(blake3::hash(data).to_hex().to_string()),
            error: None,
        }
    }

    pub fn failed(job: &FileJob, err: &JobError) -> Self {
        Self {
            source: job.source.clone(),
            destination: job.dest_path(),
            variant: job.variant,
            outcome: Outcome::Failed,
            bytes: None,
            blake3_hex: None,
            error: Some(err.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == Outcome::Ok
    }
}

/// Everything one session did, in job order.
#[derive(Serialize, Clone, Debug)]
pub struct RunSummary {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub started_utc: String,
    pub finished_utc: String,
    pub total: u64,
    pub success: u64,
    pub failure: u64,
    pub files: Vec<FileReport>,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.is_ok())
    }

    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut w, self)?;
        w.write_all(b"\n")?;
        w.flush()
    }
}

pub fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
