//! Caller-selected log level and the `fern::Dispatch` it drives, adapted in
//! style from `crates/ruff/src/logging.rs`: colored `error`/`warn` lines,
//! timestamped `info`/`debug` lines. The engine's own warnings
//! (block-comment-below, comment-relocation; spec.md §4.4/§7) are routed
//! through the `log` facade this sets up rather than a bespoke sink type.

use anyhow::Result;
use colored::Colorize;
use log::Level;

/// Emits a bold warning through `log::warn!`, matching `crates/ruff`'s
/// `warn_user!` macro.
#[macro_export]
macro_rules! warn_user {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        let message = format!($($arg)*);
        log::warn!("{}", message.bold());
    }};
}

/// Like [`warn_user`], but only ever fires once per process, for warnings
/// that would otherwise repeat once per file in a multi-file run.
#[macro_export]
macro_rules! warn_user_once {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        static WARNED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);
        if !WARNED.swap(true, std::sync::atomic::Ordering::SeqCst) {
            let message = format!($($arg)*);
            log::warn!("{}", message.bold());
        }
    }};
}

#[derive(Debug, Default, PartialOrd, Ord, PartialEq, Eq, Copy, Clone)]
pub enum LogLevel {
    /// No output at all, not even errors.
    Silent,
    /// Only the command's primary output (formatted source, diffs).
    Quiet,
    /// Errors, warnings, and per-file info lines.
    #[default]
    Default,
    /// [`LogLevel::Default`] plus debug-level tracing of file discovery and
    /// parsing decisions.
    Verbose,
}

impl LogLevel {
    const fn level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Default => log::LevelFilter::Info,
            LogLevel::Verbose => log::LevelFilter::Debug,
            LogLevel::Quiet | LogLevel::Silent => log::LevelFilter::Off,
        }
    }
}

/// Installs the global logger for `level`. Safe to call more than once per
/// process (a second call -- e.g. a second `run()` in the same test binary --
/// just keeps whichever dispatch was installed first).
pub fn set_up_logging(level: LogLevel) -> Result<()> {
    let result = fern::Dispatch::new()
        .format(|out, message, record| match record.level() {
            Level::Error => {
                out.finish(format_args!("{}{} {}", "error".red().bold(), ":".bold(), message));
            }
            Level::Warn => {
                out.finish(format_args!(
                    "{}{} {}",
                    "warning".yellow().bold(),
                    ":".bold(),
                    message
                ));
            }
            Level::Info | Level::Debug | Level::Trace => {
                out.finish(format_args!(
                    "{}[{}] {}",
                    chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                    record.level(),
                    message
                ));
            }
        })
        .level(level.level_filter())
        .chain(std::io::stderr())
        .apply();

    // A logger is already installed (most commonly: a second `run()` in the
    // same process, as in the integration test suite) -- not an error.
    let _ = result;
    Ok(())
}
