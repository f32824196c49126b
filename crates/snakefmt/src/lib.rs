#![allow(clippy::print_stdout)]
//! The `snakefmt` CLI binary's library half: argument resolution, file
//! discovery, logging setup, and the glue that drives `snakefmt_formatter`
//! over one or many files (spec.md §1, "deliberately excluded" collaborators
//! realized here rather than in the engine crate).

pub mod args;
pub mod commands;
pub mod diff;
pub mod fs;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use rayon::prelude::*;
use snakefmt_formatter::{ExternalCommandFormatter, NoopFormatter, ScriptFormatter};

use args::{Cli, FormatArguments, DEFAULT_EXCLUDE, DEFAULT_INCLUDE};
use commands::format::{format_path, FormatOutcome, FormatPathResult};
use commands::format_stdin::{format_stdin, write_stdout, StdinOutcome};
use diff::UnifiedDiff;

#[derive(Copy, Clone)]
pub enum ExitStatus {
    /// Nothing needed reformatting (or everything was written successfully).
    Success,
    /// `--check`/`--diff` found files that would be reformatted.
    WouldReformat,
    /// A file could not be read, parsed, or formatted.
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::WouldReformat => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(123),
        }
    }
}

/// Merges CLI flags with the nearest `[tool.snakefmt]` configuration table
/// (spec.md §4.7), CLI flags taking priority.
fn resolve_arguments(cli: &Cli) -> Result<FormatArguments> {
    let config_path = match &cli.config {
        Some(p) => Some(p.clone()),
        None => snakefmt_workspace::find_pyproject_toml(&cli.files),
    };

    let options = match &config_path {
        Some(p) => snakefmt_workspace::load_options(p)?,
        None => snakefmt_workspace::Options::new(),
    };

    let line_length = cli.line_length.or_else(|| {
        options
            .get("line_length")
            .and_then(toml::Value::as_integer)
            .and_then(|n| u32::try_from(n).ok())
    });
    let include = cli.include.clone().or_else(|| {
        options
            .get("include")
            .and_then(toml::Value::as_str)
            .map(str::to_string)
    });
    let exclude = cli.exclude.clone().or_else(|| {
        options
            .get("exclude")
            .and_then(toml::Value::as_str)
            .map(str::to_string)
    });

    Ok(FormatArguments {
        files: cli.files.clone(),
        line_length: line_length.unwrap_or(snakefmt_formatter::DEFAULT_LINE_LENGTH),
        include: include.unwrap_or_else(|| DEFAULT_INCLUDE.to_string()),
        exclude: exclude.unwrap_or_else(|| DEFAULT_EXCLUDE.to_string()),
        check: cli.check,
        diff: cli.diff,
        no_script_format: cli.no_script_format,
    })
}

/// Builds the embedded-script formatter, honoring a `[tool.snakefmt.script_formatter]`
/// `command` override (a list of strings: program followed by its arguments)
/// when one is configured, and falling back to `ruff format -` otherwise.
fn build_script_formatter(args: &FormatArguments, config_path: Option<&PathBuf>) -> Result<Box<dyn ScriptFormatter>> {
    if args.no_script_format {
        return Ok(Box::new(NoopFormatter));
    }

    let command = config_path
        .map(|p| snakefmt_workspace::load_script_formatter_options(p))
        .transpose()?
        .and_then(|options| options.get("command").cloned())
        .and_then(|value| value.as_array().cloned())
        .map(|items| {
            items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect::<Vec<_>>()
        });

    match command {
        Some(parts) if !parts.is_empty() => {
            let (program, rest) = parts.split_first().expect("checked non-empty above");
            Ok(Box::new(ExternalCommandFormatter::new(program.clone(), rest.to_vec())))
        }
        _ => Ok(Box::new(ExternalCommandFormatter::ruff())),
    }
}

/// Runs the resolved CLI invocation, returning the process exit status.
pub fn run(cli: Cli) -> Result<ExitStatus> {
    logging::set_up_logging(cli.log_level())?;

    let is_stdin = cli.files.len() == 1 && cli.files[0].as_os_str() == "-";
    if !is_stdin && cli.files.iter().any(|f| f.as_os_str() == "-") {
        anyhow::bail!("stdin input (\"-\") cannot be mixed with path arguments");
    }
    let config_path = cli.config.clone().or_else(|| snakefmt_workspace::find_pyproject_toml(&cli.files));
    let args = resolve_arguments(&cli)?;
    let script_formatter = build_script_formatter(&args, config_path.as_ref())?;

    if is_stdin {
        return run_stdin(&args, script_formatter.as_ref());
    }

    if args.files.is_empty() {
        log::warn!("No path provided. Nothing to do.");
        return Ok(ExitStatus::Success);
    }

    let paths = fs::discover_files(&args.files, &args.include, &args.exclude)?;
    if paths.is_empty() {
        log::warn!("No files found to format.");
        return Ok(ExitStatus::Success);
    }

    let results: Vec<FormatPathResult> = paths
        .par_iter()
        .map(|path| format_path(path, &args, script_formatter.as_ref()))
        .collect();

    report(&results, &args)
}

fn run_stdin(args: &FormatArguments, script_formatter: &dyn ScriptFormatter) -> Result<ExitStatus> {
    let outcome = format_stdin(args, script_formatter)?;
    match &outcome {
        StdinOutcome::Unchanged { .. } => {
            if !args.check && !args.diff {
                write_stdout(outcome.text())?;
            }
            Ok(ExitStatus::Success)
        }
        StdinOutcome::Formatted { .. } => {
            if args.check {
                Ok(ExitStatus::WouldReformat)
            } else if args.diff {
                write_stdout(outcome.text())?;
                Ok(ExitStatus::WouldReformat)
            } else {
                write_stdout(outcome.text())?;
                Ok(ExitStatus::Success)
            }
        }
    }
}

fn report(results: &[FormatPathResult], args: &FormatArguments) -> Result<ExitStatus> {
    let mut changed = 0u32;
    let mut unchanged = 0u32;
    let mut errored = false;

    for result in results {
        match &result.outcome {
            Ok(FormatOutcome::Unchanged) => unchanged += 1,
            Ok(FormatOutcome::Formatted) => {
                changed += 1;
                log::info!("reformatted {}", result.path.display());
            }
            Ok(FormatOutcome::WouldChange { before, after }) => {
                changed += 1;
                if args.diff {
                    print!(
                        "{}",
                        UnifiedDiff {
                            path: &result.path,
                            before,
                            after,
                        }
                    );
                } else {
                    println!("Would reformat: {}", result.path.display().to_string().bold());
                }
            }
            Err(err) => {
                errored = true;
                log::error!("{err}");
            }
        }
    }

    if changed > 0 && !args.check && !args.diff {
        log::info!(
            "{changed} file{} reformatted, {unchanged} file{} left unchanged",
            if changed == 1 { "" } else { "s" },
            if unchanged == 1 { "" } else { "s" },
        );
    }

    if errored {
        return Ok(ExitStatus::Error);
    }
    if (args.check || args.diff) && changed > 0 {
        return Ok(ExitStatus::WouldReformat);
    }
    Ok(ExitStatus::Success)
}
