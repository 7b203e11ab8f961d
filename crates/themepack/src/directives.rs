//! Extraction of `//= require` dependency directives
//!
//! This is a line-level text scan, not a JavaScript parser: comments,
//! strings and `require(...)` calls are never interpreted.

const REQUIRE_DIRECTIVE: &str = "//= require";

/// Module names declared by `//= require <name>` lines, in file order.
///
/// Lines are trimmed before the prefix test. `\n`, `\r\n` and bare `\r`
/// line endings are all accepted, and the last line needs no terminator.
/// Duplicates are kept; deduplication happens during resolution.
pub fn extract_requires(source: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(source);

    text.split(['\n', '\r'])
        .filter_map(|line| line.trim().strip_prefix(REQUIRE_DIRECTIVE))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}
