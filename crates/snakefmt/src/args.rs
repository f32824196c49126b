//! Command-line surface (spec.md §6), split the way `crates/ruff`'s
//! `args.rs` splits a user-facing `clap::Parser` struct from the resolved
//! arguments a command actually runs with.

use std::path::PathBuf;

use clap::Parser;

use crate::logging::LogLevel;

/// The uncompromising Snakemake workflow-language formatter.
#[derive(Debug, Parser)]
#[command(name = "snakefmt", about, version)]
pub struct Cli {
    /// List of files or directories to format. Pass `-` to read a single
    /// file from stdin and write the formatted result to stdout.
    pub files: Vec<PathBuf>,

    /// Number of characters per line the embedded scripting formatter
    /// should target.
    #[arg(short = 'l', long)]
    pub line_length: Option<u32>,

    /// Regular expression matching paths to include on recursive searches.
    #[arg(long)]
    pub include: Option<String>,

    /// Regular expression matching paths to exclude on recursive searches.
    /// Exclusions are calculated before inclusions.
    #[arg(long)]
    pub exclude: Option<String>,

    /// Exit with status 1 if any file would be reformatted, without writing
    /// anything back.
    #[arg(long)]
    pub check: bool,

    /// Print a unified diff of the changes each file would receive, without
    /// writing anything back.
    #[arg(long)]
    pub diff: bool,

    /// Turn on debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to a TOML configuration file. Defaults to the nearest
    /// `pyproject.toml` above the given paths.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Don't delegate embedded scripting code to an external formatter;
    /// leave it as written (besides re-indentation).
    #[arg(long)]
    pub no_script_format: bool,
}

impl Cli {
    pub fn log_level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Default
        }
    }
}

pub const DEFAULT_INCLUDE: &str = r"(\.smk$|(^|/)Snakefile[^/]*$)";
pub const DEFAULT_EXCLUDE: &str =
    r"/(\.snakemake|\.eggs|\.git|\.hg|\.mypy_cache|\.nox|\.tox|\.venv|\.svn|_build|buck-out|build|dist)/";

/// Fully resolved arguments a `format` run actually executes with: CLI flags
/// merged with the nearest `[tool.snakefmt]` configuration table (spec.md
/// §4.7/§6).
#[derive(Debug, Clone)]
pub struct FormatArguments {
    pub files: Vec<PathBuf>,
    pub line_length: u32,
    pub include: String,
    pub exclude: String,
    pub check: bool,
    pub diff: bool,
    pub no_script_format: bool,
}
