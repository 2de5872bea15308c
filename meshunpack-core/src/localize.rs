use fluent_bundle::{FluentArgs, FluentBundle, FluentResource, FluentValue};
use tracing::warn;
use unic_langid::LanguageIdentifier;

pub const DEFAULT_LANG: &str = "en-GB";

/// Simple Fluent-based localizer with built-in resources.
pub struct FluentLoc {
    bundle: FluentBundle<FluentResource>,
}

impl FluentLoc {
    /// Create a localizer using the built-in `.ftl` strings (see ../i18n).
    pub fn builtin(lang: &str) -> Self {
        let langid: LanguageIdentifier = lang
            .parse()
            .or_else(|_| DEFAULT_LANG.parse())
            .unwrap_or_default();

        // en-GB is the only bundled catalog; other tags render with it.
        let ftl_src = include_str!("../i18n/en-GB.ftl");

        let res = match FluentResource::try_new(ftl_src.to_owned()) {
            Ok(res) => res,
            Err((res, errs)) => {
                warn!(?errs, "built-in FTL resource has parse errors");
                res
            }
        };

        let mut bundle = FluentBundle::new(vec![langid]);
        // Status lines are shown verbatim; no bidi isolation marks.
        bundle.set_use_isolating(false);
        if let Err(errs) = bundle.add_resource(res) {
            warn!(?errs, "failed to add FTL resource");
        }
        Self { bundle }
    }

    /// Format a message by code with named args (("name","value"), ...).
    /// Returns the code itself if not found.
    pub fn msg(&self, code: &str, args: &[(&str, &str)]) -> String {
        let Some(msg) = self.bundle.get_message(code) else {
            return code.to_string();
        };
        let Some(pattern) = msg.value() else {
            return code.to_string();
        };

        let mut fa = FluentArgs::new();
        for (k, v) in args {
            fa.set(*k, FluentValue::from(*v));
        }

        let mut errs = vec![];
        let s = self.bundle.format_pattern(pattern, Some(&fa), &mut errs).to_string();

        if errs.is_empty() {
            s
        } else {
            code.to_string()
        }
    }

    pub fn status(&self, status: &Status<'_>) -> String {
        match status {
            Status::Ready => self.msg("status-ready", &[]),
            Status::MissingPaths => self.msg("status-missing-paths", &[]),
            Status::Scanning => self.msg("status-scanning", &[]),
            Status::ScanError(error) => self.msg("status-scan-error", &[("error", *error)]),
            Status::NoFiles => self.msg("status-no-files", &[]),
            Status::Processing { processed, total } => self.msg(
                "status-processing",
                &[("processed", &processed.to_string()), ("total", &total.to_string())],
            ),
            Status::Complete { success, failed } => self.msg(
                "status-complete",
                &[("success", &success.to_string()), ("failed", &failed.to_string())],
            ),
            Status::SpawnFailed(error) => self.msg("status-spawn-failed", &[("error", *error)]),
            Status::WorkerPanicked => self.msg("status-worker-panicked", &[]),
        }
    }
}

/// Every status line the orchestrator publishes.
#[derive(Clone, Debug)]
pub enum Status<'a> {
    Ready,
    MissingPaths,
    Scanning,
    ScanError(&'a str),
    NoFiles,
    Processing { processed: u64, total: u64 },
    Complete { success: u64, failed: u64 },
    SpawnFailed(&'a str),
    WorkerPanicked,
}
