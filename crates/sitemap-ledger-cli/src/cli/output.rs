//! Shared CLI output formatting: colours, symbols and JSON mode.
//!
//! Human-readable output goes to stderr; `--json` output goes to stdout so it
//! can be piped.

use std::io::IsTerminal;

const JSON_ENV: &str = "SITEMAP_LEDGER_JSON";
const QUIET_ENV: &str = "SITEMAP_LEDGER_QUIET";

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Record the global `--json` / `--quiet` flags for the rest of the process.
pub fn set_mode(json: bool, quiet: bool) {
    if json {
        std::env::set_var(JSON_ENV, "1");
    }
    if quiet {
        std::env::set_var(QUIET_ENV, "1");
    }
}

/// Check if --json mode is active.
pub fn is_json() -> bool {
    std::env::var_os(JSON_ENV).is_some()
}

/// Check if --quiet mode is active.
pub fn is_quiet() -> bool {
    std::env::var_os(QUIET_ENV).is_some()
}

/// Check if color output is enabled.
pub fn color_enabled() -> bool {
    // Respect NO_COLOR env (https://no-color.org/)
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stderr().is_terminal()
}

/// Colored string builder.
pub struct Styled {
    use_color: bool,
}

impl Styled {
    pub fn new() -> Self {
        Self {
            use_color: color_enabled(),
        }
    }

    /// Green checkmark symbol.
    pub fn ok_sym(&self) -> &str {
        if self.use_color {
            "\x1b[32m\u{2713}\x1b[0m"
        } else {
            "OK"
        }
    }

    /// Red X symbol.
    pub fn fail_sym(&self) -> &str {
        if self.use_color {
            "\x1b[31m\u{2717}\x1b[0m"
        } else {
            "!!"
        }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.use_color {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        self.paint(GREEN, s)
    }

    pub fn red(&self, s: &str) -> String {
        self.paint(RED, s)
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint(DIM, s)
    }

    pub fn bold(&self, s: &str) -> String {
        self.paint(BOLD, s)
    }
}

/// Print a branded header for CLI output.
pub fn print_header(s: &Styled) {
    eprintln!(
        "  {} {}",
        s.bold("sitemap-ledger"),
        s.dim(&format!("v{}", env!("CARGO_PKG_VERSION")))
    );
    eprintln!();
}

/// Format a millisecond duration (e.g., "850ms", "2.4s", "3m 12s").
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let secs = ms / 1000;
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print JSON output to stdout.
pub fn print_json(value: &serde_json::Value) {
    if let Ok(s) = serde_json::to_string_pretty(value) {
        println!("{s}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_ms() {
        assert_eq!(format_duration_ms(850), "850ms");
        assert_eq!(format_duration_ms(2_400), "2.4s");
        assert_eq!(format_duration_ms(192_000), "3m 12s");
    }

    #[test]
    fn test_plain_styling_without_color() {
        let s = Styled { use_color: false };
        assert_eq!(s.ok_sym(), "OK");
        assert_eq!(s.fail_sym(), "!!");
        assert_eq!(s.bold("x"), "x");
    }

    #[test]
    fn test_colored_styling() {
        let s = Styled { use_color: true };
        assert_eq!(s.green("ok"), "\x1b[32mok\x1b[0m");
        assert_eq!(s.red("no"), "\x1b[31mno\x1b[0m");
    }
}
