//! Path & FileMap utilities (spec §4.1).
//!
//! All filesystem paths entering the core are normalized before being used
//! as map keys or compared: forward-slash separators, no `.`/`..` segments,
//! no trailing slash. The core never folds case, so two paths that differ
//! only in case are treated as distinct keys.

use crate::host::Host;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Normalizes `path` into the canonical key form: forward slashes, no
/// trailing slash, no `.`/`..` components preserved verbatim (they are
/// collapsed the same way `Path::components()` would for an already-resolved
/// path).
pub fn normalize(path: &Path) -> PathBuf {
    use path_slash::PathExt as _;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }

    PathBuf::from(out.to_slash_lossy().trim_end_matches('/').to_string())
}

/// A canonicalized absolute path to a project's configuration manifest.
///
/// This is a distinct nominal type so that unresolved user input (a raw CLI
/// argument, a raw `references` entry from a manifest) can never be passed
/// to a graph/cache API that expects an already-resolved key: the only way
/// to produce one is [`ResolvedManifestPath::resolve`], which goes through
/// the [`Host`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedManifestPath(PathBuf);

impl ResolvedManifestPath {
    /// Resolves `path` against the host's filesystem, canonicalizing it.
    /// Returns `None` if the host cannot find the file (mirrors spec §4.3:
    /// "returns absent ... if the host cannot read the file").
    pub fn resolve(path: &Path, host: &dyn Host) -> Option<Self> {
        let canonical = host.canonicalize(path)?;
        Some(Self(normalize(&canonical)))
    }

    /// Wraps an already-canonicalized path without re-touching the host.
    /// Used internally once a path is known to be resolved (e.g. a manifest's
    /// own `manifestPath` field).
    pub(crate) fn from_canonical(path: PathBuf) -> Self {
        Self(normalize(&path))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn directory(&self) -> &Path {
        self.0.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn display(&self) -> std::path::Display<'_> {
        self.0.display()
    }
}

impl AsRef<Path> for ResolvedManifestPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for ResolvedManifestPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A mapping from normalized file path to `V`, the core's sole key-normalized
/// map primitive (spec §4.1).
#[derive(Debug, Clone)]
pub struct FileMap<V> {
    inner: HashMap<PathBuf, V>,
}

impl<V> Default for FileMap<V> {
    fn default() -> Self {
        Self { inner: HashMap::new() }
    }
}

impl<V> FileMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &Path, value: V) -> Option<V> {
        self.inner.insert(normalize(path), value)
    }

    pub fn get(&self, path: &Path) -> Option<&V> {
        self.inner.get(&normalize(path))
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut V> {
        self.inner.get_mut(&normalize(path))
    }

    /// Returns the value for `path`, or an error if absent.
    pub fn get_or_fail(&self, path: &Path) -> crate::error::Result<&V> {
        self.get(path)
            .ok_or_else(|| crate::error::BuildError::msg(format!("no entry for {}", path.display())))
    }

    /// Returns the value for `path`, or `None` if absent (no error raised).
    pub fn get_or_absent(&self, path: &Path) -> Option<&V> {
        self.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.inner.contains_key(&normalize(path))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dot_segments() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("a/b/")), PathBuf::from("a/b"));
    }

    #[test]
    fn file_map_is_keyed_by_normalized_path() {
        let mut map = FileMap::new();
        map.insert(Path::new("/root/a/./b"), 1);
        assert_eq!(map.get(Path::new("/root/a/b")), Some(&1));
        assert_eq!(map.get(Path::new("/root/a/b/")), Some(&1));
    }

    #[test]
    fn file_map_is_case_sensitive() {
        let mut map = FileMap::new();
        map.insert(Path::new("/root/A.txt"), 1);
        assert_eq!(map.get(Path::new("/root/a.txt")), None);
    }
}
