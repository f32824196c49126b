//! Parser and formatter engine for the snakefmt workflow-description
//! language: a tokenizer-driven state machine that recognises workflow
//! keywords interleaved with embedded scripting code, validates structural
//! invariants, and re-emits canonically formatted output.
//!
//! The engine never inspects or reformats scripting code itself -- that is
//! delegated through [`script_format::ScriptFormatter`] to an external
//! pretty-printer for the embedded language.

pub mod errors;
pub mod formatter;
pub mod grammar;
pub mod parameter;
pub mod parser;
pub mod script_format;
pub mod syntax;

pub use errors::{FormatError, FormatResult};
pub use grammar::GrammarId;
pub use parameter::Parameter;
pub use parser::ParserEvent;
pub use script_format::{ExternalCommandFormatter, NoopFormatter, ScriptFormatter};

/// Default line length used when a caller has no configured or CLI-supplied
/// value (spec.md §6, matching the original CLI's `--line-length` default).
pub const DEFAULT_LINE_LENGTH: u32 = 88;

/// Formats `source` in one pass: tokenize, parse into an event stream,
/// then emit canonical output text. `line_length` is forwarded to every
/// call into `script_formatter`.
pub fn format(
    source: &str,
    line_length: u32,
    script_formatter: &dyn ScriptFormatter,
) -> FormatResult<String> {
    let events = parser::parse(source)?;
    formatter::format(events, script_formatter, line_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_on_already_canonical_input() {
        let canonical = "rule a:\n    input:\n        \"in\",\n";
        let out = format(canonical, DEFAULT_LINE_LENGTH, &NoopFormatter).unwrap();
        assert_eq!(out, canonical);
    }

    #[test]
    fn idempotent_on_a_second_pass() {
        let input = "rule a:\n\tinput: \"in\"\n";
        let once = format(input, DEFAULT_LINE_LENGTH, &NoopFormatter).unwrap();
        let twice = format(&once, DEFAULT_LINE_LENGTH, &NoopFormatter).unwrap();
        assert_eq!(once, twice);
    }
}
