//! Build context (spec §3 `BuildContext`, §4.7): session-scoped memoization
//! of project statuses and of "content-unchanged output" timestamps.

use crate::{path::ResolvedManifestPath, report::Reporter, status::Status};
use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Driver options, threaded through a [`BuildContext`] for the lifetime of
/// one `build`/`clean` invocation (spec §3).
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    pub dry: bool,
    pub force: bool,
    pub verbose: bool,
}

/// Session-scoped state for one `build`/`clean` invocation (spec §3, §4.7).
///
/// `project_status` is write-once per key per session: once a status is
/// recorded, subsequent queries return exactly that value (spec's
/// memoization invariant, §3 "Invariants on Status" and §8 "Status
/// memoization").
pub struct BuildContext<'r> {
    pub options: BuildOptions,
    project_status: RefCell<HashMap<ResolvedManifestPath, Status>>,
    /// Output path -> the file's modification time *before* a content-equal
    /// rewrite (spec's "Pseudo-up-to-date correctness hinge", §9).
    unchanged_outputs: RefCell<HashMap<PathBuf, SystemTime>>,
    reporter: &'r dyn Reporter,
}

impl<'r> BuildContext<'r> {
    pub fn new(options: BuildOptions, reporter: &'r dyn Reporter) -> Self {
        Self {
            options,
            project_status: RefCell::new(HashMap::new()),
            unchanged_outputs: RefCell::new(HashMap::new()),
            reporter,
        }
    }

    /// Discards all memoization; the session's lifecycle-reset event (spec §4.7).
    /// Optionally installs new options, e.g. to flip `force`/`dry` between
    /// reuses of one long-lived driver.
    pub fn reset(&mut self, options: Option<BuildOptions>) {
        if let Some(options) = options {
            self.options = options;
        }
        self.project_status.borrow_mut().clear();
        self.unchanged_outputs.borrow_mut().clear();
    }

    /// Returns the memoized status for `path`, if any query has already
    /// computed one this session.
    pub fn cached_status(&self, path: &ResolvedManifestPath) -> Option<Status> {
        self.project_status.borrow().get(path).cloned()
    }

    /// Records `status` for `path`. Subsequent [`Self::cached_status`] calls
    /// for the same key return exactly this value for the rest of the
    /// session (spec's memoization invariant).
    pub fn record_status(&self, path: &ResolvedManifestPath, status: Status) -> Status {
        self.project_status.borrow_mut().insert(path.clone(), status.clone());
        status
    }

    pub fn unchanged_output_time(&self, path: &Path) -> Option<SystemTime> {
        self.unchanged_outputs.borrow().get(path).copied()
    }

    pub fn record_unchanged_output(&self, path: PathBuf, prior_mtime: SystemTime) {
        self.unchanged_outputs.borrow_mut().insert(path, prior_mtime);
    }

    /// Diagnostic sink, a no-op when `options.verbose` is `false` (spec §4.7).
    pub fn verbose(&self, msg: std::fmt::Arguments<'_>) {
        if self.options.verbose {
            self.reporter.verbose(msg);
        }
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter
    }
}

/// Convenience macro mirroring the spec's `verbose(msg, ...args)` signature
/// with `format!`-style interpolation.
#[macro_export]
macro_rules! verbose {
    ($ctx:expr, $($arg:tt)*) => {
        $ctx.verbose(format_args!($($arg)*))
    };
}
