//! Configuration cache (spec §3 `ParsedManifest`, §4.3 `ConfigCache`).
//!
//! Parsing of the manifest language itself is an external collaborator (spec
//! §1 Non-goals, §6): the core only ever consumes a [`ParsedManifest`]. This
//! module still ships one concrete [`ManifestParser`] implementation,
//! [`JsonManifestParser`], reading a small JSON manifest format, so the crate
//! is runnable end to end the way the teacher ships a default `SolFilesCache`
//! JSON format alongside the pluggable `Compiler` trait in `compilers/mod.rs`.

use crate::{
    error::{BuildError, Result},
    host::Host,
    path::{FileMap, ResolvedManifestPath},
};
use serde::Deserialize;
use std::{
    cell::RefCell,
    path::{Path, PathBuf},
};

/// The `jsx` compiler mode recognized by output-name computation (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JsxMode {
    #[default]
    None,
    Preserve,
    React,
    ReactJsx,
}

/// A fully parsed project manifest, as consumed by the core (spec §3).
#[derive(Debug, Clone)]
pub struct ParsedManifest {
    pub manifest_path: ResolvedManifestPath,
    pub root_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub declaration_dir: Option<PathBuf>,
    pub out_file: Option<PathBuf>,
    pub declaration: bool,
    pub declaration_map: bool,
    pub jsx: JsxMode,
    pub input_files: Vec<PathBuf>,
    /// Raw reference paths, not yet resolved to [`ResolvedManifestPath`]s.
    pub project_references: Vec<PathBuf>,
}

impl ParsedManifest {
    /// `rootDir(P) = P.rootDir ?? directoryOf(P.manifestPath)` (spec §4.4).
    pub fn root_dir(&self) -> &Path {
        self.root_dir.as_deref().unwrap_or_else(|| self.manifest_path.directory())
    }
}

/// The on-disk JSON shape [`JsonManifestParser`] understands. Field names
/// match spec §3 in `camelCase`.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    #[serde(default)]
    root_dir: Option<PathBuf>,
    #[serde(default)]
    out_dir: Option<PathBuf>,
    #[serde(default)]
    declaration_dir: Option<PathBuf>,
    #[serde(default)]
    out_file: Option<PathBuf>,
    #[serde(default)]
    declaration: bool,
    #[serde(default)]
    declaration_map: bool,
    #[serde(default)]
    jsx: JsxMode,
    #[serde(default)]
    input_files: Vec<PathBuf>,
    #[serde(default)]
    references: Vec<RawReference>,
}

#[derive(Debug, Deserialize)]
struct RawReference {
    path: PathBuf,
}

/// The external configuration-manifest parser collaborator (spec §6).
pub trait ManifestParser {
    /// Parses the manifest at `path`, read through `host`. Returns `None` if
    /// the host cannot read the file (spec §4.3).
    fn parse(&self, path: &ResolvedManifestPath, host: &dyn Host) -> Option<ParsedManifest>;
}

/// A [`ManifestParser`] reading a small JSON manifest format.
///
/// Input file paths and reference paths that are relative are resolved
/// against the manifest's own directory, matching how a real `tsconfig.json`
/// resolves relative paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonManifestParser;

impl ManifestParser for JsonManifestParser {
    fn parse(&self, path: &ResolvedManifestPath, host: &dyn Host) -> Option<ParsedManifest> {
        let content = host.read_file(path.as_path())?;
        let dir = path.directory().to_path_buf();

        let deserializer = &mut serde_json::Deserializer::from_str(&content);
        let raw: RawManifest = match serde_path_to_error::deserialize(deserializer) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!(path = %path, %err, "manifest failed to parse");
                return None;
            }
        };

        let resolve_rel = |p: &PathBuf| -> PathBuf {
            if p.is_absolute() {
                p.clone()
            } else {
                dir.join(p)
            }
        };

        Some(ParsedManifest {
            manifest_path: path.clone(),
            root_dir: raw.root_dir.map(|p| resolve_rel(&p)),
            out_dir: raw.out_dir.map(|p| resolve_rel(&p)),
            declaration_dir: raw.declaration_dir.map(|p| resolve_rel(&p)),
            out_file: raw.out_file.map(|p| resolve_rel(&p)),
            declaration: raw.declaration,
            declaration_map: raw.declaration_map,
            jsx: raw.jsx,
            input_files: raw.input_files.iter().map(resolve_rel).collect(),
            project_references: raw.references.iter().map(|r| resolve_rel(&r.path)).collect(),
        })
    }
}

/// Memoizes parsed manifests by resolved path, delegating parsing to an
/// external [`ManifestParser`] on first request (spec §4.3).
pub struct ConfigCache<'p> {
    parser: &'p dyn ManifestParser,
    cache: RefCell<FileMap<ParsedManifest>>,
}

impl<'p> ConfigCache<'p> {
    pub fn new(parser: &'p dyn ManifestParser) -> Self {
        Self { parser, cache: RefCell::new(FileMap::new()) }
    }

    /// Returns the [`ParsedManifest`] for `path`, parsing and caching it on
    /// first request. Returns `None` (without caching) if the host cannot
    /// read the file.
    #[tracing::instrument(level = "trace", skip(self, host))]
    pub fn parse_config_file(&self, path: &ResolvedManifestPath, host: &dyn Host) -> Option<ParsedManifest> {
        if let Some(existing) = self.cache.borrow().get(path.as_path()) {
            return Some(existing.clone());
        }

        let mut manifest = self.parser.parse(path, host)?;
        manifest.manifest_path = path.clone();
        self.cache.borrow_mut().insert(path.as_path(), manifest.clone());
        Some(manifest)
    }

    /// Resolves a raw reference path (as found in a manifest's
    /// `projectReferences`) relative to nothing further — callers are
    /// expected to have already joined it against the referencing manifest's
    /// directory (the [`JsonManifestParser`] does this at parse time).
    pub fn resolve_reference(&self, raw: &Path, host: &dyn Host) -> Result<ResolvedManifestPath> {
        ResolvedManifestPath::resolve(raw, host)
            .ok_or_else(|| BuildError::UnresolvedReference(raw.to_path_buf()))
    }
}

