//! Error taxonomy. Every variant carries the 1-based source line the failure
//! was detected on, so `Display` always renders the `L<n>: ` prefix required
//! by the engine's error-locality contract.

use snakefmt_parser::LexError;
use thiserror::Error;

/// Named failure categories surfaced to callers, matching the taxonomy each
/// keyword/parameter/formatting rule in this crate is documented against.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("L{line}: Colon (not {found:?}) expected after '{keyword}'")]
    ColonExpected {
        line: u32,
        keyword: String,
        found: String,
    },

    #[error("L{line}: Newline expected after keyword '{keyword}'")]
    NewlineExpected { line: u32, keyword: String },

    #[error("L{line}: Unrecognised keyword '{keyword}' in {context} definition")]
    UnrecognisedKeyword {
        line: u32,
        keyword: String,
        context: String,
    },

    #[error("L{line}: Invalid name {found:?} for '{keyword}'")]
    NamedKeywordError {
        line: u32,
        keyword: String,
        found: String,
    },

    #[error("L{line}: '{keyword}' specified twice.")]
    DuplicateKeyword { line: u32, keyword: String },

    #[error("L{line}: {keyword} has no keywords attached to it.")]
    EmptyContext { line: u32, keyword: String },

    #[error("L{line}: In {keyword} definition.")]
    NoParameters { line: u32, keyword: String },

    #[error("L{line}: {keyword} definition expects a single parameter")]
    TooManyParameters { line: u32, keyword: String },

    #[error("L{line}: {keyword} definition requires a positional (not key/value) parameter")]
    InvalidParameter { line: u32, keyword: String },

    #[error("L{line}: {message}")]
    InvalidParameterSyntax { line: u32, message: String },

    #[error("L{line}: the following was treated as scripting code to format and was not recognised as valid:\n```\n{buffer}\n```")]
    InvalidScript { line: u32, buffer: String },

    #[error("L{line}: {source}")]
    Lex { line: u32, source: LexError },

    #[error("malformed configuration file: {0}")]
    MalformattedToml(String),

    #[error("invalid script-formatter configuration: {0}")]
    InvalidScriptFormatterConfiguration(String),
}

impl FormatError {
    pub fn line(&self) -> Option<u32> {
        match self {
            FormatError::ColonExpected { line, .. }
            | FormatError::NewlineExpected { line, .. }
            | FormatError::UnrecognisedKeyword { line, .. }
            | FormatError::NamedKeywordError { line, .. }
            | FormatError::DuplicateKeyword { line, .. }
            | FormatError::EmptyContext { line, .. }
            | FormatError::NoParameters { line, .. }
            | FormatError::TooManyParameters { line, .. }
            | FormatError::InvalidParameter { line, .. }
            | FormatError::InvalidParameterSyntax { line, .. }
            | FormatError::InvalidScript { line, .. }
            | FormatError::Lex { line, .. } => Some(*line),
            FormatError::MalformattedToml(_)
            | FormatError::InvalidScriptFormatterConfiguration(_) => None,
        }
    }
}

pub type FormatResult<T> = Result<T, FormatError>;
