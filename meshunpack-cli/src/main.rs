use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use meshunpack_core::codec::DEFAULT_WORK_BUFFER_CAPACITY;
use meshunpack_core::localize::DEFAULT_LANG;
use meshunpack_core::layout::PathPolicy;
use meshunpack_core::{
    header, scan, CatalogOptions, CodecVariant, DecodeLimits, NativeBackend, Orchestrator,
    ScanFilter, SessionConfig, Snapshot,
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const PB_STYLE: &str = "{spinner} [{elapsed_precise}] {wide_bar} {pos}/{len} {msg}";

#[derive(Parser)]
#[command(name = "meshunpack", version, about = "Batch-decompress .mc and .chunk archives into a mirrored tree")]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG wins when set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args)]
struct ScanArgs {
    /// Only consider paths (relative to INPUT) matching these globs
    #[arg(long)]
    include: Vec<String>,
    /// Skip paths (relative to INPUT) matching these globs
    #[arg(long)]
    exclude: Vec<String>,
    #[arg(long, default_value_t = false)]
    follow_symlinks: bool,
}

impl ScanArgs {
    fn options(&self) -> Result<CatalogOptions> {
        let filter = ScanFilter::new(&self.include, &self.exclude).context("invalid --include/--exclude glob")?;
        Ok(CatalogOptions { policy: PathPolicy { follow_symlinks: self.follow_symlinks }, filter })
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Decompress every .mc/.chunk file under INPUT into OUTPUT
    Decompress {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        scan: ScanArgs,
        /// Scratch buffer handed to the decompressor (K/M/G suffixes)
        #[arg(long, env = "MESHUNPACK_WORK_BUFFER", value_parser = parse_size)]
        work_buffer: Option<u64>,
        /// Reject files declaring a larger output (K/M/G suffixes)
        #[arg(long, env = "MESHUNPACK_MAX_OUTPUT", value_parser = parse_size)]
        max_output: Option<u64>,
        /// Write a JSON report of every file to this path
        #[arg(long)]
        report: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        no_progress: bool,
        #[arg(long, env = "MESHUNPACK_LANG", default_value = DEFAULT_LANG)]
        lang: String,
    },
    /// List the jobs a decompress run would perform
    Scan {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Print header fields of archive files
    Inspect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Cmd::Decompress { input, output, scan, work_buffer, max_output, report, no_progress, lang } => {
            let work_buffer_capacity = match work_buffer {
                Some(n) => usize::try_from(n).context("--work-buffer does not fit in memory")?,
                None => DEFAULT_WORK_BUFFER_CAPACITY,
            };
            let mut limits = DecodeLimits::default();
            if let Some(max) = max_output {
                limits.max_output_bytes = max;
            }
            let config = SessionConfig { work_buffer_capacity, limits, catalog: scan.options()?, lang };
            decompress(&input, &output, config, report.as_deref(), !no_progress)
        }
        Cmd::Scan { input, output, scan } => list_jobs(&input, &output, &scan.options()?),
        Cmd::Inspect { files } => inspect(&files),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

fn decompress(
    input: &Path,
    output: &Path,
    config: SessionConfig,
    report: Option<&Path>,
    progress: bool,
) -> Result<ExitCode> {
    if !NativeBackend::is_available() {
        warn!("built without the `native` feature; every archive will fail to decode");
    }
    let orch = Orchestrator::new(Arc::new(NativeBackend), config);
    let handle = orch.start(input, output).context("cannot start run")?;

    let pb = progress.then(progress_bar);
    while !handle.is_finished() {
        if let Some(pb) = &pb {
            render(pb, &orch.snapshot());
        }
        thread::sleep(POLL_INTERVAL);
    }
    let result = handle.wait();
    let snap = orch.snapshot();
    if let Some(pb) = &pb {
        render(pb, &snap);
        pb.finish_and_clear();
    }
    println!("{}", snap.status);

    let summary = result?;
    for f in summary.failures() {
        eprintln!("failed: {}: {}", f.source.display(), f.error.as_deref().unwrap_or("unknown error"));
    }
    if let Some(path) = report {
        summary.write_json(path).with_context(|| format!("write report {}", path.display()))?;
    }
    Ok(if summary.failure > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(PB_STYLE) {
        pb.set_style(style);
    }
    pb
}

fn render(pb: &ProgressBar, snap: &Snapshot) {
    pb.set_length(snap.total);
    pb.set_position(snap.processed);
    pb.set_message(snap.status.clone());
}

fn list_jobs(input: &Path, output: &Path, opts: &CatalogOptions) -> Result<ExitCode> {
    let catalog = scan(input, output, opts)?;
    for job in catalog.jobs() {
        println!("{}\t{}\t{}", job.variant, job.source.display(), job.dest_path().display());
    }
    println!("total: {}", catalog.len());
    Ok(ExitCode::SUCCESS)
}

fn inspect(files: &[PathBuf]) -> Result<ExitCode> {
    let mut bad = 0usize;
    for path in files {
        let Some(variant) = CodecVariant::from_path(path) else {
            eprintln!("{}: not a .mc or .chunk file", path.display());
            bad += 1;
            continue;
        };
        let data = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let needed = header::header_len(variant);
        match header::parse(variant, &data) {
            Some(h) => println!(
                "{}: variant={} len={} header={} decompressed_size={}",
                path.display(),
                variant,
                data.len(),
                needed,
                h.decompressed_size
            ),
            None => {
                eprintln!("{}: {} bytes, shorter than the {needed}-byte {variant} header", path.display(), data.len());
                bad += 1;
            }
        }
    }
    Ok(if bad > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn parse_size(arg: &str) -> Result<u64, String> {
    let s = arg.trim().to_uppercase();
    let (num, shift) = if let Some(n) = s.strip_suffix('K') {
        (n, 10)
    } else if let Some(n) = s.strip_suffix('M') {
        (n, 20)
    } else if let Some(n) = s.strip_suffix('G') {
        (n, 30)
    } else {
        (s.as_str(), 0)
    };
    let v: u64 = num.trim().parse().map_err(|_| format!("bad size {arg}"))?;
    v.checked_mul(1u64 << shift).ok_or_else(|| format!("size {arg} overflows"))
}
