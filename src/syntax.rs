//! Tokens of the OCaml toplevel transcript syntax, and the boundary-anchored
//! pattern shared by the transcript segmenter and the output classifier.

use regex::Regex;

/// The prompt the toplevel prints before reading each statement.
pub const PROMPT: &str = "# ";

/// The token pair that ends one toplevel statement.
pub const TERMINATOR: &str = ";;";

/// Builds a pattern matching the smallest text that:
/// - starts with `beginning` at the beginning of a line
/// - ends with `ending` and any trailing whitespace at the end of a line
///
/// Both arguments are regex fragments. The body is lazy: a greedy body would
/// run on to the *last* `ending` in the text and swallow everything between.
pub fn surrounded_by(beginning: &str, ending: &str) -> Regex {
    let pattern = format!(r"(?ms)^{beginning}.*?{ending}\s*$");
    Regex::new(&pattern).expect("boundary pattern fragments are valid regex")
}
