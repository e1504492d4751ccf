//! The project-compiler collaborator (spec §6): source parsing, type
//! checking, and emission are explicitly out of scope for this core (spec
//! §1), so they are consumed only through the [`ProjectCompiler`] trait and
//! the [`Diagnostic`]/[`Severity`] shapes below.

use crate::{host::Host, manifest::ParsedManifest, path::ResolvedManifestPath};
use std::path::PathBuf;

/// Severity of a compiler diagnostic, matching the teacher's
/// `artifacts::error::Severity` shape (`Error`/`Warning`/`Info`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

impl Severity {
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

/// One diagnostic surfaced by a [`ProjectCompiler`] stage.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub file: Option<PathBuf>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, message: message.into(), file: None }
    }

    /// `true` if any diagnostic in `diagnostics` is error severity (spec §4.8
    /// steps 6-8: "if any [diagnostics], report them, flag ..., return").
    pub fn any_errors(diagnostics: &[Diagnostic]) -> bool {
        diagnostics.iter().any(|d| d.severity.is_error())
    }
}

/// Per-build result flags (spec §3 `BuildResultFlags`).
///
/// A hand-rolled bitfield rather than a `bitflags`-crate newtype: the
/// teacher's own result types (e.g. `CompilerOutput`) don't reach for
/// `bitflags` anywhere in the stack, so this sticks to plain `u8` bit ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildResultFlags(u8);

impl BuildResultFlags {
    pub const SUCCESS: Self = Self(0);
    pub const DECLARATION_OUTPUT_UNCHANGED: Self = Self(1 << 0);
    pub const CONFIG_FILE_ERRORS: Self = Self(1 << 1);
    pub const SYNTAX_ERRORS: Self = Self(1 << 2);
    pub const TYPE_ERRORS: Self = Self(1 << 3);
    pub const DECLARATION_EMIT_ERRORS: Self = Self(1 << 4);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Disjunction of the four error flags (spec §3 `AnyErrors`).
    pub fn any_errors(self) -> bool {
        self.contains(Self::CONFIG_FILE_ERRORS)
            || self.contains(Self::SYNTAX_ERRORS)
            || self.contains(Self::TYPE_ERRORS)
            || self.contains(Self::DECLARATION_EMIT_ERRORS)
    }
}

impl std::ops::BitOr for BuildResultFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One (path, content) pair a [`ProjectCompiler`] wants written to disk,
/// handed back from [`ProjectCompiler::emit`] rather than written directly,
/// so `solution::build_single_project` can apply the byte-equality /
/// `unchangedOutputs` bookkeeping spec §4.8 step 9 requires.
///
/// Declaration-ness is deliberately *not* a field here: spec §4.4 identifies
/// a declaration file purely by its `.d.ts` extension, so
/// `solution::build_single_project` derives it from `path` via
/// [`crate::outputs::is_declaration_file`] rather than trusting a
/// self-reported flag a `ProjectCompiler` impl could get wrong.
#[derive(Debug, Clone)]
pub struct EmittedFile {
    pub path: PathBuf,
    pub content: Vec<u8>,
}

/// The inputs a [`ProjectCompiler`] needs to build one project (spec §6
/// `createProgram({ rootNames, options, host, projectReferences })`).
pub struct CompileRequest<'a> {
    pub manifest: &'a ParsedManifest,
    pub project_references: &'a [ResolvedManifestPath],
    pub host: &'a dyn Host,
}

/// The external compilation-pipeline collaborator (spec §1 Non-goals, §6).
///
/// Each method corresponds to one step of spec §4.8's `buildSingleProject`
/// (options/syntactic/declaration/semantic diagnostics, then emission),
/// matching the teacher's state-machine-shaped `ProjectCompiler` in
/// `compile/project.rs` (`.preprocess()?.compile()...emit()`).
pub trait ProjectCompiler {
    fn options_diagnostics(&self, request: &CompileRequest<'_>) -> Vec<Diagnostic>;
    fn syntactic_diagnostics(&self, request: &CompileRequest<'_>) -> Vec<Diagnostic>;
    fn declaration_diagnostics(&self, request: &CompileRequest<'_>) -> Vec<Diagnostic>;
    fn semantic_diagnostics(&self, request: &CompileRequest<'_>) -> Vec<Diagnostic>;

    /// Produces the files to write. Called only once all diagnostic checks
    /// above have passed (spec §4.8 step 9).
    fn emit(&self, request: &CompileRequest<'_>) -> Vec<EmittedFile>;
}

/// A placeholder [`ProjectCompiler`] for a standalone binary that has not
/// been wired to a real compilation pipeline. Every project it's asked to
/// build reports a single config-level error, matching how the teacher's
/// `Compiler` trait objects still need *some* instance to be constructed
/// even before a concrete `Solc`/`Vyper` backend is chosen.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProjectCompiler;

impl ProjectCompiler for NoopProjectCompiler {
    fn options_diagnostics(&self, _request: &CompileRequest<'_>) -> Vec<Diagnostic> {
        vec![Diagnostic::error("no project compiler configured")]
    }

    fn syntactic_diagnostics(&self, _request: &CompileRequest<'_>) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn declaration_diagnostics(&self, _request: &CompileRequest<'_>) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn semantic_diagnostics(&self, _request: &CompileRequest<'_>) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn emit(&self, _request: &CompileRequest<'_>) -> Vec<EmittedFile> {
        Vec::new()
    }
}
