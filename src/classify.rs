//! Detects toplevel errors and exceptions in raw output.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::syntax::surrounded_by;

static EXCEPTION: Lazy<Regex> = Lazy::new(|| surrounded_by("Exception:", r"\."));
static ERROR: Lazy<Regex> = Lazy::new(|| surrounded_by("Error:", ""));

/// Discriminant of [`ReplError`], for callers that branch on kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplErrorKind {
    /// A compiler or loader error (`Error: ...`).
    Error,
    /// An exception raised while evaluating (`Exception: ...`).
    Exception,
    /// An exception raised by unfinished template code, such as
    /// `failwith "Not implemented"`.
    Unimplemented,
}

impl ReplErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplErrorKind::Error => "error",
            ReplErrorKind::Exception => "exception",
            ReplErrorKind::Unimplemented => "unimplemented",
        }
    }
}

impl std::fmt::Display for ReplErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error or exception reported by the toplevel, holding the matched text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplError {
    #[error("{0}")]
    Error(String),
    #[error("{0}")]
    Exception(String),
    #[error("{0}")]
    Unimplemented(String),
}

impl ReplError {
    pub fn kind(&self) -> ReplErrorKind {
        match self {
            ReplError::Error(_) => ReplErrorKind::Error,
            ReplError::Exception(_) => ReplErrorKind::Exception,
            ReplError::Unimplemented(_) => ReplErrorKind::Unimplemented,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ReplError::Error(text) | ReplError::Exception(text) | ReplError::Unimplemented(text) => {
                text
            }
        }
    }
}

/// Finds the error or exception in toplevel output, if there is one.
///
/// Exceptions take precedence over errors.
pub fn classify(output: &str) -> Option<ReplError> {
    parse_exception(output).or_else(|| parse_error(output))
}

fn parse_exception(output: &str) -> Option<ReplError> {
    let text = EXCEPTION.find(output)?.as_str().trim().to_string();

    // catches the usual spellings of `failwith "unimplemented"`
    if text.contains("Failure") && text.to_lowercase().contains("implemented") {
        return Some(ReplError::Unimplemented(text));
    }
    Some(ReplError::Exception(text))
}

fn parse_error(output: &str) -> Option<ReplError> {
    let text = ERROR.find(output)?.as_str().trim().to_string();
    Some(ReplError::Error(text))
}
