pub mod format;
pub mod format_stdin;
