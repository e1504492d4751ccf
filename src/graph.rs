//! Dependency graph builder (spec §4.6): DFS from roots, build a layered
//! build queue with duplicates removed in favor of later (deeper) layers.

use crate::{
    dependency_map::DependencyMapper,
    host::Host,
    manifest::{ConfigCache, ParsedManifest},
    path::ResolvedManifestPath,
    report::Reporter,
};
use std::collections::HashSet;

/// A layered build queue plus the bidirectional edge map collected while
/// building it (spec §3 `DependencyGraph`).
///
/// Layer `0` holds the roots (`pos` starts at `0` for each root in
/// `enumerate`); each reference followed descends one layer deeper, so the
/// last layer holds the deepest leaves. Consuming from the tail of the last
/// layer therefore yields a reverse-topological (leaves-first) order (spec
/// §4.6, §4.8, §9).
#[derive(Debug, Default)]
pub struct DependencyGraph {
    pub build_queue: Vec<Vec<ResolvedManifestPath>>,
    pub dependency_map: DependencyMapper,
}

impl DependencyGraph {
    /// Iterates the queue root-first (first layer to last), the order used
    /// when reporting a solution's contents (spec §4.6).
    pub fn roots_first(&self) -> impl Iterator<Item = &ResolvedManifestPath> {
        self.build_queue.iter().flatten()
    }

    /// Total number of distinct projects in the graph.
    pub fn len(&self) -> usize {
        self.build_queue.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Builder<'a> {
    host: &'a dyn Host,
    config_cache: &'a ConfigCache<'a>,
    reporter: &'a dyn Reporter,
    build_queue: Vec<Vec<ResolvedManifestPath>>,
    dependency_map: DependencyMapper,
}

/// Builds the [`DependencyGraph`] reachable from `roots` by DFS, resolving
/// each raw root path against `host` (spec §4.6).
#[tracing::instrument(level = "trace", skip_all)]
pub fn create_dependency_graph(
    roots: &[std::path::PathBuf],
    host: &dyn Host,
    config_cache: &ConfigCache<'_>,
    reporter: &dyn Reporter,
) -> DependencyGraph {
    let mut builder =
        Builder { host, config_cache, reporter, build_queue: Vec::new(), dependency_map: DependencyMapper::new() };

    for root in roots {
        let Some(path) = ResolvedManifestPath::resolve(root, host) else {
            reporter.error(&format!("project {} does not exist", root.display()));
            continue;
        };
        let Some(manifest) = config_cache.parse_config_file(&path, host) else {
            reporter.error(&format!("could not parse {path}"));
            continue;
        };
        builder.enumerate(&path, &manifest, 0);
    }

    dedup_queue(&mut builder.build_queue);

    DependencyGraph { build_queue: builder.build_queue, dependency_map: builder.dependency_map }
}

impl<'a> Builder<'a> {
    #[tracing::instrument(level = "trace", skip_all, fields(project = %path, pos))]
    fn enumerate(&mut self, path: &ResolvedManifestPath, manifest: &ParsedManifest, pos: usize) {
        if self.build_queue.len() <= pos {
            self.build_queue.resize_with(pos + 1, Vec::new);
        }
        if !self.build_queue[pos].iter().any(|existing| existing == path) {
            tracing::trace!(layer = pos, "placing project in layer");
            self.build_queue[pos].push(path.clone());
        }

        if manifest.project_references.is_empty() {
            tracing::trace!("no project references, stopping recursion");
            return;
        }

        for raw_ref in &manifest.project_references {
            let Ok(actual_path) = self.config_cache.resolve_reference(raw_ref, self.host) else {
                tracing::debug!(reference = %raw_ref.display(), "failed to resolve project reference");
                self.reporter.error(&format!("failed to resolve project reference {}", raw_ref.display()));
                continue;
            };

            self.dependency_map.add_reference(path, &actual_path);

            let Some(actual_manifest) = self.config_cache.parse_config_file(&actual_path, self.host) else {
                tracing::debug!(reference = %actual_path, "could not parse referenced project");
                self.reporter.error(&format!("could not parse {actual_path}"));
                continue;
            };

            self.enumerate(&actual_path, &actual_manifest, pos + 1);
        }
    }
}

/// Removes duplicates: for each layer `i` in `[0, len-2]`, filter out any
/// entry that also appears in a later (deeper) layer, so every project ends
/// up in the deepest layer it was reached in (spec §4.6, §8 "De-duplication").
fn dedup_queue(build_queue: &mut [Vec<ResolvedManifestPath>]) {
    let len = build_queue.len();
    if len < 2 {
        return;
    }

    for i in 0..len - 1 {
        let mut later: HashSet<ResolvedManifestPath> = HashSet::new();
        for layer in &build_queue[i + 1..] {
            later.extend(layer.iter().cloned());
        }
        build_queue[i].retain(|path| !later.contains(path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        host::memory::MemoryHost,
        manifest::JsonManifestParser,
        report::NullReporter,
    };

    fn write_manifest(host: &MemoryHost, path: &str, refs: &[&str], inputs: &[&str]) {
        let refs_json: Vec<String> =
            refs.iter().map(|r| format!(r#"{{"path": "{r}"}}"#)).collect();
        let inputs_json: Vec<String> = inputs.iter().map(|i| format!(r#""{i}""#)).collect();
        let content = format!(
            r#"{{"inputFiles": [{}], "references": [{}]}}"#,
            inputs_json.join(","),
            refs_json.join(",")
        );
        host.seed(path, content);
    }

    #[test]
    fn leaves_come_before_roots_and_duplicates_land_in_deepest_layer() {
        let host = MemoryHost::new();
        // root -> a -> leaf
        //      -> leaf  (diamond: leaf reachable at depth 1 and depth 2)
        write_manifest(&host, "/leaf/tsconfig.json", &[], &["/leaf/a.ts"]);
        host.seed("/leaf/a.ts", "x");
        write_manifest(&host, "/a/tsconfig.json", &["../leaf/tsconfig.json"], &["/a/a.ts"]);
        host.seed("/a/a.ts", "x");
        write_manifest(
            &host,
            "/root/tsconfig.json",
            &["../a/tsconfig.json", "../leaf/tsconfig.json"],
            &["/root/a.ts"],
        );
        host.seed("/root/a.ts", "x");

        let parser = JsonManifestParser;
        let cache = ConfigCache::new(&parser);
        let reporter = NullReporter;

        let graph = create_dependency_graph(
            &[std::path::PathBuf::from("/root/tsconfig.json")],
            &host,
            &cache,
            &reporter,
        );

        assert_eq!(graph.len(), 3);
        // leaf must end up in the deepest (highest-index) layer it's reachable from,
        // since layer 0 holds the roots and each reference descends one layer.
        let leaf = ResolvedManifestPath::resolve(std::path::Path::new("/leaf/tsconfig.json"), &host).unwrap();
        let root = ResolvedManifestPath::resolve(std::path::Path::new("/root/tsconfig.json"), &host).unwrap();

        let leaf_layer = graph.build_queue.iter().position(|layer| layer.contains(&leaf)).unwrap();
        let root_layer = graph.build_queue.iter().position(|layer| layer.contains(&root)).unwrap();
        assert!(leaf_layer > root_layer);

        // leaf appears in exactly one layer.
        let occurrences = graph.build_queue.iter().filter(|layer| layer.contains(&leaf)).count();
        assert_eq!(occurrences, 1);
    }
}
