//! Output-mode helpers shared by all commands.
//!
//! The binary sets these env flags from its global CLI flags so every
//! module can check the active output mode without plumbing.

/// Machine-readable JSON output requested.
pub fn is_json() -> bool {
    std::env::var("SITEROVER_JSON").is_ok()
}

/// Non-essential output suppressed.
pub fn is_quiet() -> bool {
    std::env::var("SITEROVER_QUIET").is_ok()
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}
