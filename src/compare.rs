//! Output comparison that tolerates the whitespace differences introduced by
//! line-wrapping in transcripts.

use std::borrow::Cow;
use std::fmt;

use log::debug;

use crate::classify::classify;
use crate::test::TestOutcome;

/// A text normalization applied to both sides before comparing them.
///
/// Strategies are tried in [`Strategy::ALL`] order, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// The texts are identical.
    Identity,
    /// Leading and trailing whitespace removed.
    Trim,
    /// Every whitespace run collapsed to one space, then trimmed.
    NormalizeWhitespace,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Identity,
        Strategy::Trim,
        Strategy::NormalizeWhitespace,
    ];

    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            Strategy::Identity => Cow::Borrowed(text),
            Strategy::Trim => Cow::Borrowed(text.trim()),
            Strategy::NormalizeWhitespace => Cow::Owned(normalize_whitespace(text)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Identity => "identity",
            Strategy::Trim => "trim",
            Strategy::NormalizeWhitespace => "normalize_whitespace",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Replaces every run of whitespace with a single space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the first strategy under which `actual` and `expected` are equal.
pub fn compare(actual: &str, expected: &str) -> Option<Strategy> {
    Strategy::ALL
        .into_iter()
        .find(|strategy| strategy.apply(actual) == strategy.apply(expected))
}

/// Compares one statement's output against its expectation and classifies
/// any error in the output.
///
/// The classification never decides the result: a test may expect an
/// exception as its correct output.
pub fn evaluate(input: &str, output: String, expected: &str) -> TestOutcome {
    let strategy = compare(&output, expected);
    if let Some(strategy) = strategy {
        let function = input.split_whitespace().next().unwrap_or("");
        debug!("Test {:?} passed with method {:?}", function, strategy.as_str());
    }
    let error = classify(&output);

    TestOutcome {
        success: strategy.is_some(),
        output,
        error,
        strategy,
    }
}
