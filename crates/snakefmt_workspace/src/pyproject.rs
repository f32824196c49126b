//! Discovery and parsing of `pyproject.toml`-style configuration, mirroring
//! `snakefmt`'s `config.py` (spec.md §4.7): a `[tool.snakefmt]` table for
//! formatter options, and a `[tool.snakefmt.script_formatter]` table for the
//! embedded-language formatter, both with normalized keys.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::Value;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed configuration file {}: {source}", path.display())]
    MalformattedToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// An option mapping read out of a TOML table, keyed by normalized option
/// name (spec.md §4.7).
pub type Options = HashMap<String, Value>;

/// Returns the directory that should be treated as the project root for
/// `srcs`: the nearest common ancestor of every source path, walked upward
/// until a `.git` directory, `.hg` directory, or `pyproject.toml` file is
/// found. Falls back to the common ancestor itself (or the current
/// directory, for an empty `srcs`) if none is found.
///
/// Adapted from `find_project_root` in `config.py`, which in turn credits
/// Black for the algorithm.
pub fn find_project_root(srcs: &[PathBuf]) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let absolute: Vec<PathBuf> = if srcs.is_empty() {
        vec![cwd.clone()]
    } else {
        srcs.iter().map(|s| cwd.join(s)).collect()
    };

    let mut common: Option<PathBuf> = None;
    for src in &absolute {
        let dir = if src.is_dir() {
            src.clone()
        } else {
            src.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.clone())
        };
        common = Some(match common {
            None => dir,
            Some(acc) => common_prefix(&acc, &dir),
        });
    }
    let start = common.unwrap_or(cwd);

    for dir in start.ancestors() {
        if dir.join(".git").exists() || dir.join(".hg").exists() || dir.join("pyproject.toml").is_file() {
            return dir.to_path_buf();
        }
    }
    start
}

fn common_prefix(a: &Path, b: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for (ca, cb) in a.components().zip(b.components()) {
        if ca != cb {
            break;
        }
        out.push(ca.as_os_str());
    }
    out
}

/// Locates a `pyproject.toml` in [`find_project_root`]'s result for `srcs`,
/// if one exists.
pub fn find_pyproject_toml(srcs: &[PathBuf]) -> Option<PathBuf> {
    let candidate = find_project_root(srcs).join("pyproject.toml");
    candidate.is_file().then_some(candidate)
}

fn normalize_key(key: &str) -> String {
    key.trim_start_matches("--").replace('-', "_")
}

fn read_tool_table(path: &Path, nested_under: &[&str]) -> ConfigResult<toml::value::Table> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: Value = toml::from_str(&text).map_err(|source| ConfigError::MalformattedToml {
        path: path.to_path_buf(),
        source,
    })?;

    let mut table = root
        .get("tool")
        .and_then(Value::as_table)
        .cloned()
        .unwrap_or_default();
    for key in nested_under {
        table = match table.get(*key).and_then(Value::as_table) {
            Some(t) => t.clone(),
            None => return Ok(toml::value::Table::new()),
        };
    }
    Ok(table)
}

/// Reads the `[tool.snakefmt]` table, normalizing keys by stripping a
/// leading `--` and replacing `-` with `_`, so CLI-flag spelling and
/// configuration-file spelling resolve to the same option.
pub fn load_options(path: &Path) -> ConfigResult<Options> {
    let table = read_tool_table(path, &["snakefmt"])?;
    Ok(table
        .into_iter()
        .map(|(k, v)| (normalize_key(&k), v))
        .collect())
}

/// Reads the `[tool.snakefmt.script_formatter]` table. `skip_*` booleans are
/// normalized by stripping the `skip_` prefix and inverting the value,
/// matching `config.py`'s `read_black_config` (which compensates for the
/// embedded formatter's `skip_string_normalization`-style flags being
/// phrased as negatives of the option they configure).
pub fn load_script_formatter_options(path: &Path) -> ConfigResult<Options> {
    let table = read_tool_table(path, &["snakefmt", "script_formatter"])?;
    let mut out = Options::new();
    for (key, val) in table {
        let key = key.replace('-', "_");
        if let Some(rest) = key.strip_prefix("skip_") {
            let inverted = match &val {
                Value::Boolean(b) => Value::Boolean(!b),
                other => other.clone(),
            };
            out.insert(rest.to_string(), inverted);
        } else {
            out.insert(key, val);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_and_normalizes_tool_snakefmt_keys() {
        let f = write_toml("[tool.snakefmt]\n--line-length = 100\ninclude = \"foo\"\n");
        let opts = load_options(f.path()).unwrap();
        assert_eq!(opts.get("line_length").unwrap().as_integer(), Some(100));
        assert_eq!(opts.get("include").unwrap().as_str(), Some("foo"));
    }

    #[test]
    fn missing_table_is_empty_not_an_error() {
        let f = write_toml("[tool.other]\nx = 1\n");
        assert!(load_options(f.path()).unwrap().is_empty());
    }

    #[test]
    fn script_formatter_skip_booleans_are_inverted_and_unprefixed() {
        let f = write_toml(
            "[tool.snakefmt.script_formatter]\nskip_string_normalization = true\nline_length = 99\n",
        );
        let opts = load_script_formatter_options(f.path()).unwrap();
        assert_eq!(
            opts.get("string_normalization").unwrap().as_bool(),
            Some(false)
        );
        assert_eq!(opts.get("line_length").unwrap().as_integer(), Some(99));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let f = write_toml("not valid toml [[[");
        assert!(matches!(
            load_options(f.path()),
            Err(ConfigError::MalformattedToml { .. })
        ));
    }
}
