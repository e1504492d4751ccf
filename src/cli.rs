//! CLI surface (spec §6): thin glue shaping inputs to the core, specified
//! for completeness since it determines what `project specs` reach
//! [`crate::solution::SolutionBuilder`].

use crate::{
    error::{BuildError, Result},
    host::Host,
};
use clap::Parser;
use std::path::{Path, PathBuf};

/// `tsbuild` — a multi-project incremental build orchestrator.
#[derive(Debug, Parser)]
#[clap(name = "tsbuild", version)]
pub struct Cli {
    /// Project specs to build (or clean). A spec is either a manifest file
    /// directly, or a directory containing one (spec §6). Defaults to `.`
    /// when none are given.
    pub projects: Vec<PathBuf>,

    /// Print a status line for every project considered, not only the ones
    /// that need work.
    #[clap(long, short)]
    pub verbose: bool,

    /// Report what would happen without touching the filesystem.
    #[clap(long, short)]
    pub dry: bool,

    /// Rebuild every project regardless of its up-to-date status.
    #[clap(long, short)]
    pub force: bool,

    /// Delete every expected output instead of building.
    #[clap(long)]
    pub clean: bool,
}

impl Cli {
    /// The project specs to operate on, with the implicit `"."` default
    /// applied (spec §6: "Zero positional arguments → implicit `.`").
    pub fn project_specs(&self) -> Vec<PathBuf> {
        if self.projects.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.projects.clone()
        }
    }
}

/// Resolves one raw project spec against `cwd` (spec §6): if the resolved
/// path exists and is a file it is used verbatim; otherwise `tsconfig.json`
/// is appended and re-tested. Returns [`BuildError::UnresolvedProjectSpec`]
/// if neither exists (spec §7, error kind 1: "diagnostic, abort the entire
/// invocation").
pub fn resolve_project_spec(spec: &Path, cwd: &Path, host: &dyn Host) -> Result<PathBuf> {
    let joined = if spec.is_absolute() { spec.to_path_buf() } else { cwd.join(spec) };

    if host.file_exists(&joined) {
        return Ok(joined);
    }

    let with_manifest = joined.join("tsconfig.json");
    if host.file_exists(&with_manifest) {
        return Ok(with_manifest);
    }

    Err(BuildError::UnresolvedProjectSpec(spec.to_path_buf()))
}
