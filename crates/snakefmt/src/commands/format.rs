//! Formats one file on disk: read, run the engine, and either write the
//! result back, report it as a pending change, or surface an error --
//! mirroring the shape (if not the notebook/cache machinery) of
//! `crates/ruff/src/commands/format.rs::format_path`.

use std::fs;
use std::path::{Path, PathBuf};

use snakefmt_formatter::{FormatError, ScriptFormatter};
use thiserror::Error;

use crate::args::FormatArguments;

#[derive(Debug, Error)]
pub enum FormatPathError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

/// The outcome of formatting a single file.
#[derive(Debug)]
pub enum FormatOutcome {
    /// The file was already canonical.
    Unchanged,
    /// The file was reformatted and written back to disk.
    Formatted,
    /// The file would be reformatted; nothing was written (`--check`/`--diff`).
    WouldChange { before: String, after: String },
}

pub struct FormatPathResult {
    pub path: PathBuf,
    pub outcome: Result<FormatOutcome, FormatPathError>,
}

/// Formats the file at `path` according to `args`. Never writes when
/// `args.check` or `args.diff` is set.
pub fn format_path(
    path: &Path,
    args: &FormatArguments,
    script_formatter: &dyn ScriptFormatter,
) -> FormatPathResult {
    let outcome = format_path_inner(path, args, script_formatter);
    FormatPathResult {
        path: path.to_path_buf(),
        outcome,
    }
}

fn format_path_inner(
    path: &Path,
    args: &FormatArguments,
    script_formatter: &dyn ScriptFormatter,
) -> Result<FormatOutcome, FormatPathError> {
    let before = fs::read_to_string(path).map_err(|source| FormatPathError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let after = snakefmt_formatter::format(&before, args.line_length, script_formatter).map_err(|source| {
        FormatPathError::Format {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if after == before {
        return Ok(FormatOutcome::Unchanged);
    }

    if args.check || args.diff {
        return Ok(FormatOutcome::WouldChange { before, after });
    }

    fs::write(path, &after).map_err(|source| FormatPathError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(FormatOutcome::Formatted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snakefmt_formatter::NoopFormatter;
    use std::io::Write;

    fn args(check: bool, diff: bool) -> FormatArguments {
        FormatArguments {
            files: vec![],
            line_length: 88,
            include: crate::args::DEFAULT_INCLUDE.to_string(),
            exclude: crate::args::DEFAULT_EXCLUDE.to_string(),
            check,
            diff,
            no_script_format: true,
        }
    }

    #[test]
    fn writes_back_reformatted_contents_by_default() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "rule a:\n\tinput: \"a\"\n").unwrap();
        let result = format_path(f.path(), &args(false, false), &NoopFormatter);
        assert!(matches!(result.outcome, Ok(FormatOutcome::Formatted)));
        let contents = fs::read_to_string(f.path()).unwrap();
        assert!(contents.contains("    input:\n"));
    }

    #[test]
    fn check_mode_does_not_write() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "rule a:\n\tinput: \"a\"\n").unwrap();
        let original = fs::read_to_string(f.path()).unwrap();
        let result = format_path(f.path(), &args(true, false), &NoopFormatter);
        assert!(matches!(result.outcome, Ok(FormatOutcome::WouldChange { .. })));
        assert_eq!(fs::read_to_string(f.path()).unwrap(), original);
    }

    #[test]
    fn already_canonical_file_is_unchanged() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "rule a:\n    input:\n        \"a\",\n").unwrap();
        let result = format_path(f.path(), &args(false, false), &NoopFormatter);
        assert!(matches!(result.outcome, Ok(FormatOutcome::Unchanged)));
    }

    #[test]
    fn parse_errors_surface_as_format_path_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "rule a\n").unwrap();
        let result = format_path(f.path(), &args(false, false), &NoopFormatter);
        assert!(matches!(result.outcome, Err(FormatPathError::Format { .. })));
    }
}
