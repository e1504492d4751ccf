//! Output-name computation (spec §4.4): pure functions deriving the set of
//! expected output paths from a parsed manifest.

use crate::manifest::{JsxMode, ParsedManifest};
use std::path::{Path, PathBuf};

/// One expected output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedOutput {
    pub path: PathBuf,
    pub is_declaration: bool,
}

fn with_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

/// `declarationDir ?? outDir ?? directoryOf(manifestPath)` (spec §4.4).
fn declaration_dir(manifest: &ParsedManifest) -> &Path {
    manifest
        .declaration_dir
        .as_deref()
        .or(manifest.out_dir.as_deref())
        .unwrap_or_else(|| manifest.manifest_path.directory())
}

/// Computes the set of expected output paths for `manifest`, in a stable
/// order: for the per-input case, inputs are processed in their declared
/// order, and for each input the primary output is emitted before its
/// declaration output/sourcemap (spec §4.5 step 2 relies on this order to
/// decide which output is "oldest").
pub fn expected_outputs(manifest: &ParsedManifest) -> Vec<ExpectedOutput> {
    if let Some(out_file) = &manifest.out_file {
        return bundled_outputs(manifest, out_file);
    }

    let root_dir = manifest.root_dir();
    let out_dir = manifest
        .out_dir
        .clone()
        .unwrap_or_else(|| manifest.manifest_path.directory().to_path_buf());
    let decl_dir = declaration_dir(manifest).to_path_buf();

    let mut outputs = Vec::with_capacity(manifest.input_files.len() * 2);

    for input in &manifest.input_files {
        let rel = input.strip_prefix(root_dir).unwrap_or(input).to_path_buf();

        let is_tsx = input.extension().map_or(false, |ext| ext == "tsx");
        let primary_ext = if is_tsx && manifest.jsx == JsxMode::Preserve { "jsx" } else { "js" };
        let primary = with_extension(&out_dir.join(&rel), primary_ext);
        outputs.push(ExpectedOutput { path: primary, is_declaration: false });

        if manifest.declaration {
            // `.d.ts` replaces the whole extension (`Foo.tsx` -> `Foo.d.ts`),
            // achieved by stripping the original extension first.
            let base = decl_dir.join(&rel);
            let decl = replace_extension_with(&base, "d.ts");
            outputs.push(ExpectedOutput { path: decl.clone(), is_declaration: true });

            if manifest.declaration_map {
                // Append `.map` to the declaration *path*, not to the
                // length of some intermediate push result (spec §9 notes
                // this as a bug in the source this spec was derived from).
                let map_path = append_suffix(&decl, ".map");
                outputs.push(ExpectedOutput { path: map_path, is_declaration: false });
            }
        }
    }

    outputs
}

fn bundled_outputs(manifest: &ParsedManifest, out_file: &Path) -> Vec<ExpectedOutput> {
    let mut outputs = vec![ExpectedOutput { path: out_file.to_path_buf(), is_declaration: false }];

    if manifest.declaration {
        let decl = replace_extension_with(out_file, "d.ts");
        outputs.push(ExpectedOutput { path: decl.clone(), is_declaration: true });

        if manifest.declaration_map {
            outputs.push(ExpectedOutput { path: append_suffix(&decl, ".map"), is_declaration: false });
        }
    }

    outputs
}

/// Replaces the full extension (including multi-dot extensions like
/// `.d.ts`) with `new_ext`, e.g. `Foo.tsx` + `d.ts` -> `Foo.d.ts`.
fn replace_extension_with(path: &Path, new_ext: &str) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();
    let mut file_name = stem.to_os_string();
    file_name.push(".");
    file_name.push(new_ext);
    path.with_file_name(file_name)
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// A `.d.ts` file is identified purely by extension (spec §4.4).
pub fn is_declaration_file(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".d.ts")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ResolvedManifestPath;

    fn manifest(input_files: Vec<&str>, declaration: bool, declaration_map: bool) -> ParsedManifest {
        ParsedManifest {
            manifest_path: ResolvedManifestPath::from_canonical(PathBuf::from("/proj/tsconfig.json")),
            root_dir: Some(PathBuf::from("/proj/src")),
            out_dir: Some(PathBuf::from("/proj/dist")),
            declaration_dir: None,
            out_file: None,
            declaration,
            declaration_map,
            jsx: JsxMode::None,
            input_files: input_files.into_iter().map(PathBuf::from).collect(),
            project_references: vec![],
        }
    }

    #[test]
    fn primary_output_only() {
        let m = manifest(vec!["/proj/src/a.ts"], false, false);
        let outs = expected_outputs(&m);
        assert_eq!(outs, vec![ExpectedOutput { path: PathBuf::from("/proj/dist/a.js"), is_declaration: false }]);
    }

    #[test]
    fn declaration_and_map_outputs() {
        let m = manifest(vec!["/proj/src/a.ts"], true, true);
        let outs = expected_outputs(&m);
        assert_eq!(
            outs,
            vec![
                ExpectedOutput { path: PathBuf::from("/proj/dist/a.js"), is_declaration: false },
                ExpectedOutput { path: PathBuf::from("/proj/dist/a.d.ts"), is_declaration: true },
                ExpectedOutput { path: PathBuf::from("/proj/dist/a.d.ts.map"), is_declaration: false },
            ]
        );
    }

    #[test]
    fn tsx_with_jsx_preserve_emits_jsx_extension() {
        let mut m = manifest(vec!["/proj/src/a.tsx"], false, false);
        m.jsx = JsxMode::Preserve;
        let outs = expected_outputs(&m);
        assert_eq!(outs[0].path, PathBuf::from("/proj/dist/a.jsx"));
    }

    #[test]
    fn out_file_bundles_declaration() {
        let mut m = manifest(vec!["/proj/src/a.ts", "/proj/src/b.ts"], true, false);
        m.out_file = Some(PathBuf::from("/proj/dist/bundle.js"));
        let outs = expected_outputs(&m);
        assert_eq!(
            outs,
            vec![
                ExpectedOutput { path: PathBuf::from("/proj/dist/bundle.js"), is_declaration: false },
                ExpectedOutput { path: PathBuf::from("/proj/dist/bundle.d.ts"), is_declaration: true },
            ]
        );
    }

    #[test]
    fn declaration_file_detection() {
        assert!(is_declaration_file(Path::new("/a/b.d.ts")));
        assert!(!is_declaration_file(Path::new("/a/b.ts")));
    }
}
