//! Reads one workflow file from standard input and writes the formatted
//! result to standard output, the `-` path named in spec.md §6's CLI
//! surface.

use std::io::{self, Read, Write};

use snakefmt_formatter::ScriptFormatter;

use crate::args::FormatArguments;

/// The outcome of formatting stdin. Unlike [`super::format::format_path`],
/// there is no file to compare against on disk, so `--check`/`--diff` are
/// evaluated against the content actually read. `text` is always the
/// canonical result -- equal to the original input when [`Self::Unchanged`].
pub enum StdinOutcome {
    Unchanged { text: String },
    Formatted { text: String },
}

impl StdinOutcome {
    pub fn text(&self) -> &str {
        match self {
            StdinOutcome::Unchanged { text } | StdinOutcome::Formatted { text } => text,
        }
    }
}

pub fn format_stdin(
    args: &FormatArguments,
    script_formatter: &dyn ScriptFormatter,
) -> anyhow::Result<StdinOutcome> {
    let mut source = String::new();
    io::stdin().read_to_string(&mut source)?;

    let formatted = snakefmt_formatter::format(&source, args.line_length, script_formatter)?;

    if formatted == source {
        return Ok(StdinOutcome::Unchanged { text: formatted });
    }
    Ok(StdinOutcome::Formatted { text: formatted })
}

/// Writes `source` verbatim to stdout, used when `--check`/`--diff` is not
/// set and the caller just wants the formatted text.
pub fn write_stdout(source: &str) -> io::Result<()> {
    io::stdout().write_all(source.as_bytes())
}
