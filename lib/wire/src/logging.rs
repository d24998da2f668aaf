//! Structured logging setup, shared by the monitor, the worker and the
//! client. Built on `slog`/`sloggers` the same way the rest of this
//! workspace wires up logging: a single terminal logger constructed once at
//! startup and cloned (with extra key-value context) into each component.

pub use slog::{self, debug, error, info, o, warn, Logger};

use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

/// Build the root logger for a process. `verbosity` follows the CLI
/// convention of repeated `-d` flags: 0 is informational, 1 is debug, 2+ is
/// trace-level detail from the underlying drain.
pub fn init(verbosity: u8) -> Logger {
    let mut builder = TerminalLoggerBuilder::new();
    builder.destination(Destination::Stderr);
    builder.level(match verbosity {
        0 => Severity::Info,
        1 => Severity::Debug,
        _ => Severity::Trace,
    });

    builder
        .build()
        .expect("failed to construct terminal logger")
}

/// A logger that discards everything, used for components (mostly tests)
/// that don't want to thread a real logger through.
pub fn discard() -> Logger {
    Logger::root(slog::Discard, o!())
}
