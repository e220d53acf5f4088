//! Splits toplevel transcripts into `(input, expected)` test cases.
//!
//! A transcript block looks like the toplevel session it was copied from:
//!
//! ```text
//! # let double x = 2 * x;;
//! val double : int -> int = <fun>
//! # double 21;;
//! - : int = 42
//! ```
//!
//! Every statement starts at a line beginning with the prompt and ends at the
//! nearest `;;` that closes a line. Whatever follows, up to the next
//! statement, is that statement's expected output.

use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::html::{self, CodeBlock};
use crate::syntax::{surrounded_by, PROMPT, TERMINATOR};
use crate::test::{SourcePosition, TestCase, TestSuite};

static STATEMENT: Lazy<Regex> = Lazy::new(|| surrounded_by(PROMPT, TERMINATOR));

/// Parses the tests in one transcript block.
///
/// Returns an empty suite when the block holds no statements.
pub fn parse_tests(text: &str, position: Option<SourcePosition>) -> TestSuite {
    let statements: Vec<_> = STATEMENT.find_iter(text).collect();
    if statements.is_empty() {
        match &position {
            Some(pos) => debug!("No tests found for block at {}", pos),
            None => debug!("No tests found for block at unknown position"),
        }
        return TestSuite::new(Vec::new(), position);
    }

    // outputs are the text between statements
    let ends = statements
        .iter()
        .skip(1)
        .map(|next| next.start())
        .chain(std::iter::once(text.len()));

    let tests = statements
        .iter()
        .zip(ends)
        .map(|(statement, end)| {
            let input = statement.as_str().trim_end();
            let input = input.strip_prefix(PROMPT).unwrap_or(input);
            let output = &text[statement.end()..end];
            let output = output.strip_prefix('\n').unwrap_or(output);
            TestCase::new(input, output)
        })
        .collect();

    TestSuite::new(tests, position)
}

/// Parses every block, dropping blocks without tests.
pub fn parse_blocks(blocks: impl IntoIterator<Item = CodeBlock>) -> Vec<TestSuite> {
    blocks
        .into_iter()
        .map(|block| parse_tests(&block.text, block.position))
        .filter(|suite| !suite.is_empty())
        .collect()
}

/// Extracts the code blocks of an html page and parses their tests.
pub fn parse_html_tests(page: &str, file: Option<&Path>) -> Vec<TestSuite> {
    parse_blocks(html::extract_blocks(page, file))
}
