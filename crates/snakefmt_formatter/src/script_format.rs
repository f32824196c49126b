//! The boundary between this crate and whatever formats the scripting
//! language embedded in `run:`/top-level Python blocks. The engine never
//! inspects or reimplements that formatter (spec.md §5.7); it only ever
//! calls through this trait.

use std::io::Write as _;
use std::process::{Command, Stdio};

use crate::errors::{FormatError, FormatResult};

/// Formats a buffer of embedded scripting code at a given indentation level.
///
/// Implementors receive the buffer dedented to column 0 and are expected to
/// return formatted code, also dedented to column 0; the caller re-applies
/// `indent` itself. A buffer that is empty or whitespace-only is never
/// passed in -- callers short-circuit that case before reaching here.
pub trait ScriptFormatter {
    fn format(&self, source: &str, line_length: u32) -> FormatResult<String>;
}

/// Delegates to an external command, feeding `source` on stdin and reading
/// formatted code back from stdout. This is how a production build wires in
/// a real formatter (e.g. `ruff format -`) without this crate linking
/// against it directly.
pub struct ExternalCommandFormatter {
    program: String,
    args: Vec<String>,
}

impl ExternalCommandFormatter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The conventional default: `ruff format -`, reading from and writing
    /// to standard streams.
    pub fn ruff() -> Self {
        Self::new("ruff", vec!["format".to_string(), "-".to_string()])
    }
}

impl ScriptFormatter for ExternalCommandFormatter {
    fn format(&self, source: &str, line_length: u32) -> FormatResult<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--line-length")
            .arg(line_length.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                FormatError::InvalidScriptFormatterConfiguration(format!(
                    "failed to launch `{} {}`: {e}",
                    self.program,
                    self.args.join(" ")
                ))
            })?;

        // Writer runs on a scoped thread so a formatter that doesn't read
        // stdin to completion before writing stdout can't deadlock us.
        let mut stdin = child.stdin.take().expect("stdin was piped");
        let source_owned = source.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(source_owned.as_bytes()));

        let output = child.wait_with_output().map_err(|e| {
            FormatError::InvalidScriptFormatterConfiguration(format!(
                "`{}` did not run to completion: {e}",
                self.program
            ))
        })?;
        let _ = writer.join();

        if !output.status.success() {
            return Err(FormatError::InvalidScript {
                line: 0,
                buffer: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        String::from_utf8(output.stdout).map_err(|e| {
            FormatError::InvalidScriptFormatterConfiguration(format!(
                "`{}` produced non-UTF-8 output: {e}",
                self.program
            ))
        })
    }
}

/// A formatter that returns its input unchanged, used by tests and by
/// `--no-format-scripts`-style configurations that disable delegation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFormatter;

impl ScriptFormatter for NoopFormatter {
    fn format(&self, source: &str, _line_length: u32) -> FormatResult<String> {
        Ok(source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_formatter_passes_through() {
        let f = NoopFormatter;
        assert_eq!(f.format("x = 1\n", 88).unwrap(), "x = 1\n");
    }
}
