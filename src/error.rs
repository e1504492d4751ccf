//! Crate-wide error type.

use std::{io, path::PathBuf};

/// Errors the solution builder can surface.
///
/// Mirrors the shape of a typical compiler-adjacent error enum: IO and
/// (de)serialization errors are forwarded transparently, the rest are
/// specific to the builder's own invariants.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to resolve project reference {0}")]
    UnresolvedReference(PathBuf),

    #[error("project spec {0} does not exist")]
    UnresolvedProjectSpec(PathBuf),

    #[error("host does not support required capability: {0}")]
    MissingHostCapability(&'static str),

    #[error("{0}")]
    Msg(String),
}

impl BuildError {
    pub(crate) fn msg(msg: impl std::fmt::Display) -> Self {
        BuildError::Msg(msg.to_string())
    }

    /// Attaches the path a failing IO operation was performed against.
    pub(crate) fn io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        BuildError::Msg(format!("{}: {err}", path.display()))
    }
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;
