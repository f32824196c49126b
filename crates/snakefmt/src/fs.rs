//! Recursive file discovery: walks the given paths, honoring `.gitignore`
//! (via the `ignore` crate) and the `--include`/`--exclude` regular
//! expressions, mirroring `get_snakefile_files_in_dir` in the original CLI's
//! `snakefmt.py` (spec.md §1, "file discovery... named only").

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use log::debug;
use regex::Regex;

/// Collects every file under `paths` that should be formatted: directories
/// are walked recursively (respecting `.gitignore` and the `exclude`
/// pattern), while explicitly-named files are taken as-is regardless of
/// extension -- matching the original CLI's "if a file was explicitly given,
/// we don't care about its extension" behavior.
pub fn discover_files(paths: &[PathBuf], include: &str, exclude: &str) -> Result<Vec<PathBuf>> {
    let include = Regex::new(include).with_context(|| format!("invalid --include regex: {include}"))?;
    let exclude = Regex::new(exclude).with_context(|| format!("invalid --exclude regex: {exclude}"))?;

    let mut out = Vec::new();
    for path in paths {
        if path.as_os_str() == "-" {
            out.push(path.clone());
            continue;
        }
        if path.is_file() {
            out.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            debug!("ignoring invalid path: {}", path.display());
            continue;
        }
        walk_dir(path, &include, &exclude, &mut out);
    }
    out.sort();
    out.dedup();
    Ok(out)
}

fn walk_dir(root: &Path, include: &Regex, exclude: &Regex, out: &mut Vec<PathBuf>) {
    for entry in WalkBuilder::new(root).hidden(false).build() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                debug!("ignoring entry: {err}");
                continue;
            }
        };
        if entry.path() == root {
            continue;
        }
        let normalized = normalized_posix_path(entry.path());
        if exclude.is_match(&normalized) {
            debug!("excluded: {} matched --exclude", entry.path().display());
            continue;
        }
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        if is_dir {
            continue;
        }
        if include.is_match(&normalized) {
            debug!("included: {} matched --include", entry.path().display());
            out.push(entry.into_path());
        } else {
            debug!(
                "ignoring: {} did not match --include",
                entry.path().display()
            );
        }
    }
}

/// Renders `path` with forward slashes regardless of platform, the way the
/// include/exclude regexes in `snakefmt.py` expect.
fn normalized_posix_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_smk_files_and_skips_others() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.smk"), "rule a:\n").unwrap();
        fs::write(dir.path().join("b.txt"), "not a workflow").unwrap();
        fs::create_dir(dir.path().join(".snakemake")).unwrap();
        fs::write(dir.path().join(".snakemake/c.smk"), "rule c:\n").unwrap();

        let found = discover_files(
            &[dir.path().to_path_buf()],
            crate::args::DEFAULT_INCLUDE,
            crate::args::DEFAULT_EXCLUDE,
        )
        .unwrap();

        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("a.smk"));
    }

    #[test]
    fn explicit_file_argument_bypasses_include_filter() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("Snakefile.txt");
        fs::write(&f, "rule a:\n").unwrap();

        let found = discover_files(
            &[f.clone()],
            crate::args::DEFAULT_INCLUDE,
            crate::args::DEFAULT_EXCLUDE,
        )
        .unwrap();
        assert_eq!(found, vec![f]);
    }

    #[test]
    fn stdin_marker_passes_through_untouched() {
        let found = discover_files(
            &[PathBuf::from("-")],
            crate::args::DEFAULT_INCLUDE,
            crate::args::DEFAULT_EXCLUDE,
        )
        .unwrap();
        assert_eq!(found, vec![PathBuf::from("-")]);
    }
}
