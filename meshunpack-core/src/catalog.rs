use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::codec::CodecVariant;
use crate::error::ScanError;
use crate::layout::{self, PathPolicy};

/// One matched input file and where its output goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileJob {
    pub source: PathBuf,
    pub variant: CodecVariant,
    pub dest_dir: PathBuf,
    pub dest_name: OsString,
}

impl FileJob {
    pub fn dest_path(&self) -> PathBuf {
        self.dest_dir.join(&self.dest_name)
    }
}

/// Optional include/exclude globs, matched against the `/`-separated path
/// relative to the input root. No includes means everything is included.
#[derive(Clone, Debug, Default)]
pub struct ScanFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl ScanFilter {
    pub fn new(includes: &[String], excludes: &[String]) -> Result<Self, globset::Error> {
        Ok(Self { include: build_globset(includes)?, exclude: build_globset(excludes)? })
    }

    pub fn allows(&self, rel: &str) -> bool {
        if let Some(inc) = &self.include {
            if !inc.is_match(rel) {
                return false;
            }
        }
        !self.exclude.as_ref().is_some_and(|exc| exc.is_match(rel))
    }
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, globset::Error> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for g in patterns {
        b.add(Glob::new(g)?);
    }
    Ok(Some(b.build()?))
}

#[derive(Clone, Debug, Default)]
pub struct CatalogOptions {
    pub policy: PathPolicy,
    pub filter: ScanFilter,
}

/// Fully materialized scan result; `len()` is the run's fixed total.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    jobs: Vec<FileJob>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[FileJob] {
        &self.jobs
    }

    pub fn into_jobs(self) -> Vec<FileJob> {
        self.jobs
    }
}

/// Walk `root` and collect every `.mc`/`.chunk` file, in file-name order.
/// Any entry that cannot be enumerated aborts the scan.
pub fn scan(root: &Path, output_root: &Path, opts: &CatalogOptions) -> Result<Catalog, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let mut jobs = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(opts.policy.follow_symlinks)
        .sort_by_file_name();
    for ent in walker {
        let ent = ent.map_err(|source| ScanError::Walk {
            path: source.path().unwrap_or(root).to_path_buf(),
            source,
        })?;
        if !is_file_entry(&ent) {
            continue;
        }
        let path = ent.path();
        let Some(variant) = CodecVariant::from_path(path) else {
            continue;
        };
        let rel = path.strip_prefix(root).unwrap_or(path);
        if !opts.filter.allows(&layout::slash_path(rel)) {
            debug!(path = %path.display(), "excluded by filter");
            continue;
        }
        let (dest_dir, dest_name) = layout::destination_for(root, output_root, path)?;
        jobs.push(FileJob { source: path.to_path_buf(), variant, dest_dir, dest_name });
    }
    info!(root = %root.display(), total = jobs.len(), "scan complete");
    Ok(Catalog { jobs })
}

/// Regular files, plus symlinks that resolve to one. Directory links are only
/// descended when the walker follows links.
fn is_file_entry(ent: &walkdir::DirEntry) -> bool {
    if ent.file_type().is_file() {
        return true;
    }
    if !ent.path_is_symlink() {
        return false;
    }
    match fs::metadata(ent.path()) {
        Ok(md) => md.is_file(),
        Err(e) => {
            debug!(path = %ent.path().display(), error = %e, "dangling symlink skipped");
            false
        }
    }
}
