//! The host abstraction: the filesystem/clock collaborator named in spec §6.
//!
//! The core never touches `std::fs` directly outside of [`RealHost`] so that
//! the up-to-date analyzer and the graph builder can be exercised against an
//! in-memory filesystem in tests (see [`MemoryHost`] below), the same role
//! the teacher's `project-util` feature plays for its own `Project` tests.

use crate::error::{BuildError, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Synchronous filesystem + clock interface consumed by the core.
///
/// All operations are expected to complete before returning (spec §5: the
/// core runs single-threaded and synchronously). Implementations are not
/// required to be `Send`/`Sync`; the core never spawns additional threads.
pub trait Host {
    /// Current working directory, used to resolve relative CLI project specs.
    fn current_dir(&self) -> PathBuf;

    /// Returns `true` if `path` exists and is a file.
    fn file_exists(&self, path: &Path) -> bool;

    /// Reads `path` as UTF-8 text. Returns `None` if the file cannot be read,
    /// matching spec §6's `readFile(path) -> string?`.
    fn read_file(&self, path: &Path) -> Option<String>;

    /// Writes `content` to `path`, creating parent directories as needed.
    fn write_file(&self, path: &Path, content: &[u8]) -> Result<()>;

    /// Deletes `path`. Optional capability; hosts that can't support
    /// deletion (spec §7, error kind 2) should return
    /// [`BuildError::MissingHostCapability`] and report `false` from
    /// [`Self::supports_delete`] so callers can assert eagerly instead of
    /// only discovering it lazily on the first actual deletion attempt.
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Whether this host supports [`Self::delete_file`] (spec §7, error kind
    /// 2: "host capability missing ... fatal assertion"). `clean_projects`
    /// checks this unconditionally, before attempting any deletion, so a
    /// `clean` against a delete-incapable host fails even when there is
    /// nothing to delete.
    fn supports_delete(&self) -> bool {
        true
    }

    /// Returns the last-modification time of `path`. Required (spec §6).
    fn modified_time(&self, path: &Path) -> Result<SystemTime>;

    /// Sets the last-modification time of `path`. Required (spec §6), used
    /// by the fast-stamp path (§4.8 step 3, `UpToDateWithUpstreamTypes`).
    fn set_modified_time(&self, path: &Path, time: SystemTime) -> Result<()>;

    /// Canonicalizes `path` into the form used for [`crate::path::ResolvedManifestPath`]
    /// keys. Returns `None` if the path does not exist.
    fn canonicalize(&self, path: &Path) -> Option<PathBuf>;
}

/// The default [`Host`], backed directly by `std::fs` and `std::time`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealHost;

impl Host for RealHost {
    fn current_dir(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        fs::read_to_string(path).ok()
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(e, parent))?;
        }
        fs::write(path, content).map_err(|e| BuildError::io(e, path))
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| BuildError::io(e, path))
    }

    fn modified_time(&self, path: &Path) -> Result<SystemTime> {
        fs::metadata(path).and_then(|m| m.modified()).map_err(|e| BuildError::io(e, path))
    }

    fn set_modified_time(&self, path: &Path, time: SystemTime) -> Result<()> {
        let ft = filetime::FileTime::from_system_time(time);
        filetime::set_file_mtime(path, ft).map_err(|e| BuildError::io(e, path))
    }

    fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
        dunce::canonicalize(path).ok()
    }
}

/// An in-memory [`Host`] used by tests and the [`crate::status`]/[`crate::graph`]
/// unit tests to avoid real filesystem timestamp granularity flakiness.
///
/// Gated the same way the teacher gates its `project-util` mock-workspace
/// helpers: only compiled for tests or when the `test-util` feature is on.
#[cfg(any(test, feature = "test-util"))]
pub mod memory {
    use super::*;
    use std::{
        cell::RefCell,
        collections::HashMap,
        time::Duration,
    };

    #[derive(Debug, Clone)]
    struct Entry {
        content: Option<Vec<u8>>,
        modified: SystemTime,
    }

    /// An in-memory filesystem with a manually advanceable logical clock.
    #[derive(Debug)]
    pub struct MemoryHost {
        files: RefCell<HashMap<PathBuf, Entry>>,
        clock: RefCell<SystemTime>,
        supports_delete: bool,
    }

    impl Default for MemoryHost {
        fn default() -> Self {
            Self {
                files: RefCell::new(HashMap::new()),
                clock: RefCell::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000)),
                supports_delete: true,
            }
        }
    }

    impl MemoryHost {
        pub fn new() -> Self {
            Self::default()
        }

        /// Builds a host whose [`Host::delete_file`] always fails, to exercise
        /// spec §7 error kind 2 (host capability missing).
        pub fn without_delete() -> Self {
            Self { supports_delete: false, ..Self::default() }
        }

        /// Advances the logical clock. Subsequent writes/stamps observe the
        /// new "now".
        pub fn advance(&self, duration: Duration) {
            let mut clock = self.clock.borrow_mut();
            *clock += duration;
        }

        /// Writes `content` at `path` with the clock's current time, without
        /// going through the `Host` byte-equality bookkeeping `solution`
        /// performs — used to seed fixtures directly.
        pub fn seed(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
            let now = *self.clock.borrow();
            let key = crate::path::normalize(path.as_ref());
            self.files.borrow_mut().insert(key, Entry { content: Some(content.into()), modified: now });
        }

        /// Touches `path` (updates its modification time to "now") without
        /// changing its content. Used to simulate an edited input file.
        pub fn touch(&self, path: impl AsRef<Path>) {
            let now = *self.clock.borrow();
            let key = crate::path::normalize(path.as_ref());
            if let Some(entry) = self.files.borrow_mut().get_mut(&key) {
                entry.modified = now;
            }
        }

        pub fn now(&self) -> SystemTime {
            *self.clock.borrow()
        }
    }

    impl Host for MemoryHost {
        fn current_dir(&self) -> PathBuf {
            PathBuf::from("/")
        }

        fn file_exists(&self, path: &Path) -> bool {
            let key = crate::path::normalize(path);
            self.files.borrow().get(&key).map_or(false, |e| e.content.is_some())
        }

        fn read_file(&self, path: &Path) -> Option<String> {
            let key = crate::path::normalize(path);
            self.files
                .borrow()
                .get(&key)
                .and_then(|e| e.content.as_ref())
                .and_then(|bytes| String::from_utf8(bytes.clone()).ok())
        }

        fn write_file(&self, path: &Path, content: &[u8]) -> Result<()> {
            let now = *self.clock.borrow();
            let key = crate::path::normalize(path);
            self.files
                .borrow_mut()
                .insert(key, Entry { content: Some(content.to_vec()), modified: now });
            Ok(())
        }

        fn delete_file(&self, path: &Path) -> Result<()> {
            if !self.supports_delete {
                return Err(BuildError::MissingHostCapability("delete_file"));
            }
            let key = crate::path::normalize(path);
            self.files.borrow_mut().remove(&key);
            Ok(())
        }

        fn supports_delete(&self) -> bool {
            self.supports_delete
        }

        fn modified_time(&self, path: &Path) -> Result<SystemTime> {
            let key = crate::path::normalize(path);
            self.files
                .borrow()
                .get(&key)
                .filter(|e| e.content.is_some())
                .map(|e| e.modified)
                .ok_or_else(|| BuildError::msg(format!("{} does not exist", path.display())))
        }

        fn set_modified_time(&self, path: &Path, time: SystemTime) -> Result<()> {
            let key = crate::path::normalize(path);
            let mut files = self.files.borrow_mut();
            let entry = files
                .get_mut(&key)
                .ok_or_else(|| BuildError::msg(format!("{} does not exist", path.display())))?;
            entry.modified = time;
            Ok(())
        }

        fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
            let key = crate::path::normalize(path);
            if self.file_exists(&key) {
                Some(key)
            } else {
                None
            }
        }
    }

    pub use MemoryHost as TestHost;
}
