use regex::Regex;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9_-]+").expect("valid regex"));

/// Reduce a raw identifier to its matching key.
///
/// Takes the first run of letters, digits, `_` or `-` and lowercases it, so
/// "ATM-01 Jakarta" and " atm-01" both become "atm-01". Returns an empty
/// string when the input has no such run.
pub fn normalize(raw: &str) -> String {
    TOKEN
        .find(raw.trim())
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default()
}
