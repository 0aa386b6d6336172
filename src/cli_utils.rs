/// CLI utilities for consistent output formatting
use std::io::IsTerminal;

/// `[cmk]` prefix, bright cyan when stderr is a TTY
pub fn cmk_prefix() -> &'static str {
    if std::io::stderr().is_terminal() {
        "\x1b[96m[cmk]\x1b[0m"
    } else {
        "[cmk]"
    }
}
