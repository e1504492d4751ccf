//! Up-to-date analyzer (spec §3 `Status`, §4.5).

use crate::{
    context::BuildContext,
    host::Host,
    manifest::{ConfigCache, ManifestParser, ParsedManifest},
    outputs::expected_outputs,
    path::ResolvedManifestPath,
};
use std::{
    path::PathBuf,
    time::SystemTime,
};

/// A project's up-to-date state (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Unbuildable {
        reason: String,
    },
    UpToDate {
        newest_input_time: SystemTime,
        newest_decl_changed_time: SystemTime,
        newest_output_time: SystemTime,
    },
    UpToDateWithUpstreamTypes {
        newest_input_time: SystemTime,
        newest_decl_changed_time: SystemTime,
        newest_output_time: SystemTime,
    },
    OutputMissing {
        missing_output: PathBuf,
    },
    OutOfDateWithSelf {
        out_of_date_output: PathBuf,
        newer_input: PathBuf,
    },
    OutOfDateWithUpstream {
        out_of_date_output: PathBuf,
        newer_project: ResolvedManifestPath,
    },
    UpstreamOutOfDate {
        upstream_project: ResolvedManifestPath,
    },
    UpstreamBlocked {
        upstream_project: ResolvedManifestPath,
    },
}

impl Status {
    /// `true` for either flavor of up-to-date (spec §4.5 step 3: "not
    /// `UpToDate`" treats `UpToDateWithUpstreamTypes` as *not* up to date,
    /// so this is deliberately narrower than "doesn't need a rebuild").
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, Status::UpToDate { .. })
    }

    pub fn is_unbuildable(&self) -> bool {
        matches!(self, Status::Unbuildable { .. })
    }

    pub fn newest_decl_changed_time(&self) -> Option<SystemTime> {
        match self {
            Status::UpToDate { newest_decl_changed_time, .. }
            | Status::UpToDateWithUpstreamTypes { newest_decl_changed_time, .. } => {
                Some(*newest_decl_changed_time)
            }
            _ => None,
        }
    }

    pub fn newest_input_time(&self) -> Option<SystemTime> {
        match self {
            Status::UpToDate { newest_input_time, .. }
            | Status::UpToDateWithUpstreamTypes { newest_input_time, .. } => Some(*newest_input_time),
            _ => None,
        }
    }

    /// One-sentence, operator-facing rendering used by both [`crate::report`]
    /// (spec §4.8.1) and the CLI's plain output (SPEC_FULL §C.4): the single
    /// production call site an exhaustive `match` here is meant to keep in
    /// sync (spec §9: "adding a new variant must be a compile-time
    /// obligation on the reporter").
    pub fn description(&self, project_name: &str) -> String {
        match self {
            Status::Unbuildable { reason } => format!("project '{project_name}' is unbuildable: {reason}"),
            Status::UpToDate { .. } => format!("project '{project_name}' is up to date"),
            Status::UpToDateWithUpstreamTypes { .. } => format!(
                "project '{project_name}' is up to date with upstream .d.ts content unchanged, fast-stamping"
            ),
            Status::OutputMissing { missing_output } => {
                format!("project '{project_name}' output {} is missing", missing_output.display())
            }
            Status::OutOfDateWithSelf { out_of_date_output, newer_input } => format!(
                "project '{project_name}' output {} is older than input {}",
                out_of_date_output.display(),
                newer_input.display()
            ),
            Status::OutOfDateWithUpstream { out_of_date_output, newer_project } => format!(
                "project '{project_name}' output {} is older than upstream project {}",
                out_of_date_output.display(),
                newer_project
            ),
            Status::UpstreamOutOfDate { upstream_project } => {
                format!("project '{project_name}' upstream project {upstream_project} is out of date")
            }
            Status::UpstreamBlocked { upstream_project } => {
                format!("project '{project_name}' upstream project {upstream_project} is blocked")
            }
        }
    }
}

/// Computes (and memoizes via `context`) the [`Status`] of `manifest` (spec
/// §4.5). Recurses into upstream projects' statuses through the same
/// `context`, so natural memoization also bounds the work done for diamond
/// dependencies.
#[tracing::instrument(level = "trace", skip_all, fields(project = %manifest.manifest_path))]
pub fn get_up_to_date_status(
    manifest: &ParsedManifest,
    host: &dyn Host,
    parser: &dyn ManifestParser,
    config_cache: &ConfigCache<'_>,
    context: &BuildContext<'_>,
) -> Status {
    if let Some(cached) = context.cached_status(&manifest.manifest_path) {
        return cached;
    }

    let status = compute_status(manifest, host, parser, config_cache, context);
    context.record_status(&manifest.manifest_path, status)
}

/// Same as [`get_up_to_date_status`] but resolves `path` through `config_cache`
/// first (spec §4.8 `getUpToDateStatusOfFile`).
pub fn get_up_to_date_status_of_file(
    path: &ResolvedManifestPath,
    host: &dyn Host,
    parser: &dyn ManifestParser,
    config_cache: &ConfigCache<'_>,
    context: &BuildContext<'_>,
) -> Status {
    if let Some(cached) = context.cached_status(path) {
        return cached;
    }
    match config_cache.parse_config_file(path, host) {
        Some(manifest) => get_up_to_date_status(&manifest, host, parser, config_cache, context),
        None => context.record_status(
            path,
            Status::Unbuildable { reason: "config file errors".to_string() },
        ),
    }
}

fn compute_status(
    manifest: &ParsedManifest,
    host: &dyn Host,
    parser: &dyn ManifestParser,
    config_cache: &ConfigCache<'_>,
    context: &BuildContext<'_>,
) -> Status {
    // 1. Input scan.
    let mut newest_input_time = SystemTime::UNIX_EPOCH;
    let mut newest_input_file: Option<PathBuf> = None;
    for input in &manifest.input_files {
        if !host.file_exists(input) {
            tracing::debug!(input = %input.display(), "input does not exist");
            return Status::Unbuildable { reason: format!("{} does not exist", input.display()) };
        }
        let Ok(t) = host.modified_time(input) else {
            tracing::debug!(input = %input.display(), "input mtime unreadable");
            return Status::Unbuildable { reason: format!("{} does not exist", input.display()) };
        };
        if newest_input_file.is_none() || t > newest_input_time {
            newest_input_time = t;
            newest_input_file = Some(input.clone());
        }
    }

    // 2. Output scan.
    let outputs = expected_outputs(manifest);
    let mut oldest_output_time = None::<SystemTime>;
    let mut oldest_output_file: Option<PathBuf> = None;
    let mut newest_output_time = None::<SystemTime>;
    let mut newest_decl_changed_time = SystemTime::UNIX_EPOCH;
    let mut missing_output: Option<PathBuf> = None;
    let mut is_out_of_date_with_inputs = false;

    for output in &outputs {
        if !host.file_exists(&output.path) {
            tracing::trace!(output = %output.path.display(), "output missing");
            missing_output = Some(output.path.clone());
            break;
        }

        let Ok(t) = host.modified_time(&output.path) else {
            tracing::trace!(output = %output.path.display(), "output mtime unreadable, treating as missing");
            missing_output = Some(output.path.clone());
            break;
        };

        if oldest_output_time.map_or(true, |oldest| t < oldest) {
            oldest_output_time = Some(t);
            oldest_output_file = Some(output.path.clone());
        }
        if newest_output_time.map_or(true, |newest| t > newest) {
            newest_output_time = Some(t);
        }

        if t < newest_input_time {
            tracing::trace!(output = %output.path.display(), "output older than newest input");
            is_out_of_date_with_inputs = true;
            break;
        }

        if output.is_declaration {
            let folded = context.unchanged_output_time(&output.path).unwrap_or(t);
            if folded > newest_decl_changed_time {
                newest_decl_changed_time = folded;
            }
        }
    }

    let oldest_output_time = oldest_output_time.unwrap_or(SystemTime::UNIX_EPOCH);

    // 3. Upstream scan (runs before returning on local-out-of-date states).
    let mut pseudo_up_to_date = false;
    for raw_ref in &manifest.project_references {
        let Ok(upstream_path) = config_cache.resolve_reference(raw_ref, host) else {
            tracing::debug!(reference = %raw_ref.display(), "project reference does not resolve");
            return Status::UpstreamBlocked {
                upstream_project: ResolvedManifestPath::from_canonical(raw_ref.clone()),
            };
        };
        let Some(upstream_manifest) = config_cache.parse_config_file(&upstream_path, host) else {
            tracing::debug!(upstream = %upstream_path, "upstream config failed to parse");
            return Status::UpstreamBlocked { upstream_project: upstream_path };
        };

        let upstream_status =
            get_up_to_date_status(&upstream_manifest, host, parser, config_cache, context);

        if upstream_status.is_unbuildable() {
            tracing::trace!(upstream = %upstream_path, "upstream is unbuildable");
            return Status::UpstreamBlocked { upstream_project: upstream_path };
        }

        if !upstream_status.is_up_to_date() {
            tracing::trace!(upstream = %upstream_path, "upstream is not up to date");
            return Status::UpstreamOutOfDate { upstream_project: upstream_path };
        }

        let Some(upstream_newest_input) = upstream_status.newest_input_time() else {
            continue;
        };

        if upstream_newest_input <= oldest_output_time {
            continue;
        }

        let upstream_decl_changed = upstream_status.newest_decl_changed_time().unwrap_or(upstream_newest_input);
        if upstream_decl_changed <= oldest_output_time {
            tracing::trace!(upstream = %upstream_path, "upstream declaration content unchanged, pseudo-up-to-date");
            pseudo_up_to_date = true;
            continue;
        }

        tracing::trace!(upstream = %upstream_path, "upstream newer than our oldest output");
        return Status::OutOfDateWithUpstream {
            out_of_date_output: oldest_output_file.clone().unwrap_or_default(),
            newer_project: upstream_path,
        };
    }

    // 4. Local conclusion.
    if let Some(missing) = missing_output {
        tracing::debug!(missing = %missing.display(), "concluding output missing");
        return Status::OutputMissing { missing_output: missing };
    }

    if is_out_of_date_with_inputs {
        tracing::debug!("concluding out of date with self");
        return Status::OutOfDateWithSelf {
            out_of_date_output: oldest_output_file.unwrap_or_default(),
            newer_input: newest_input_file.unwrap_or_default(),
        };
    }

    let newest_output_time = newest_output_time.unwrap_or(SystemTime::UNIX_EPOCH);

    if pseudo_up_to_date {
        tracing::trace!("concluding up to date with upstream types");
        Status::UpToDateWithUpstreamTypes {
            newest_input_time,
            newest_decl_changed_time,
            newest_output_time,
        }
    } else {
        tracing::trace!("concluding up to date");
        Status::UpToDate { newest_input_time, newest_decl_changed_time, newest_output_time }
    }
}
