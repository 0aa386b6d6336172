//! Structured logging for cmk
//!
//! Diagnostics go to stderr so they interleave with CMake's own output
//! without touching stdout. The default filter is `warn`: a routine run
//! prints nothing but CMake's output and cmk's `[cmk]` progress lines.
//!
//! # Log Format Conventions
//!
//! - `operation`: the step being performed ("fingerprint", "configure", "build", "write")
//! - `status`: the result ("success", "skipped", "error")
//! - `reason`: why a reconfigure was triggered
//! - `exit_code`: exit code of an external command
//!
//! # Examples
//!
//! ```rust
//! use tracing::info;
//!
//! info!(
//!     operation = "configure",
//!     status = "success",
//!     duration_ms = 1200u64,
//!     "configure step finished"
//! );
//! ```

use std::fmt as std_fmt;
use std::io::{self, IsTerminal};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{
    fmt::{self, format::Writer},
    prelude::*,
    EnvFilter,
};

/// One line per event: `HH:MM:SS.mmm LEVEL(cmk): message fields`
///
/// No module path; every line comes from cmk and sits between CMake output.
struct CmkFormatter {
    color: bool,
}

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[31m",
        Level::WARN => "\x1b[33m",
        Level::INFO => "\x1b[32m",
        Level::DEBUG => "\x1b[34m",
        Level::TRACE => "\x1b[35m",
    }
}

impl<S, N> FormatEvent<S, N> for CmkFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std_fmt::Result {
        let level = event.metadata().level();
        let (start, end) = if self.color {
            (level_color(level), "\x1b[0m")
        } else {
            ("", "")
        };

        write!(
            writer,
            "{} {}{:5}(cmk){}: ",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            start,
            level,
            end
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored when stderr is a terminal
    Pretty,
    /// Same layout, never colored (CI)
    Compact,
    /// JSON lines
    Json,
}

impl LogFormat {
    /// Parse from a `CMK_LOG_FORMAT` value; `ci` says whether `CI` is set
    pub fn parse(value: &str, ci: bool) -> Self {
        match value.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            "pretty" => Self::Pretty,
            _ if ci => Self::Compact,
            _ => Self::Pretty,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(
            &std::env::var("CMK_LOG_FORMAT").unwrap_or_default(),
            std::env::var("CI").is_ok(),
        )
    }

    /// Whether ANSI colors are emitted, given whether stderr is a terminal
    pub fn colored(self, terminal: bool) -> bool {
        self == Self::Pretty && terminal
    }
}

/// Initialize the global tracing subscriber
///
/// # Environment Variables
///
/// - `RUST_LOG`: log filter (default "warn")
/// - `CMK_LOG_FORMAT`: "pretty", "compact" or "json"
/// - `CI`: if set, defaults to compact format
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match LogFormat::from_env() {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(io::stderr)
                    .json(),
            )
            .init(),
        format => registry
            .with(
                fmt::layer()
                    .event_format(CmkFormatter {
                        color: format.colored(io::stderr().is_terminal()),
                    })
                    .with_writer(io::stderr),
            )
            .init(),
    }
}
