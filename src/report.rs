//! Diagnostic reporter (spec §6 "Diagnostic reporter", §4.8.1 Status Reporting).
//!
//! The core never writes to stdout itself; it calls through a [`Reporter`] at
//! each decision point, the same separation the teacher keeps between its
//! `trace!`/`debug!` developer logs and whatever an embedder does with
//! emitted `Error`/`Severity` values.

/// Severity attached to an operator-facing message, mirroring
/// `artifacts::error::Severity` in spirit (error vs informational).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Info,
}

/// The external diagnostic-reporter collaborator (spec §6).
///
/// `error` messages are what the CLI's exit-code decision is based on (spec
/// §6: "exit code nonzero iff any reported diagnostic is of error
/// severity"); `verbose` messages are status-reporting only and never
/// fatal (spec §4.8.1).
pub trait Reporter {
    fn report(&self, severity: Severity, message: &str);

    fn error(&self, message: &str) {
        self.report(Severity::Error, message);
    }

    fn verbose(&self, msg: std::fmt::Arguments<'_>) {
        self.report(Severity::Info, &msg.to_string());
    }
}

/// Discards everything. Used by tests that don't care about reporter output
/// and want a silent collaborator, the same role a `/dev/null` sink plays in
/// the teacher's own unit tests that don't assert on log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _severity: Severity, _message: &str) {}
}

/// Default production [`Reporter`]: forwards to `tracing`, and separately
/// counts whether any error-severity diagnostic was ever reported, so the
/// binary entry point can compute its exit code (spec §6).
#[derive(Debug, Default)]
pub struct TracingReporter {
    had_error: std::cell::Cell<bool>,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` iff [`Reporter::error`]/[`Reporter::report`] with
    /// [`Severity::Error`] has been called at least once.
    pub fn had_error(&self) -> bool {
        self.had_error.get()
    }
}

impl Reporter for TracingReporter {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => {
                self.had_error.set(true);
                tracing::error!("{message}");
            }
            Severity::Info => tracing::info!("{message}"),
        }
    }
}
