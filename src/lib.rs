//! Runs the OCaml toplevel examples from FoCS homework pages against a
//! solution file.
//!
//! A page's code blocks are split into [`TestSuite`]s of [`TestCase`]s by
//! [`transcript`], each input is run in a fresh toplevel by [`ReplDriver`],
//! and [`SuiteRunner`] compares the output with the transcript's expectation.

pub use crate::classify::{classify, ReplError, ReplErrorKind};
pub use crate::compare::{compare, Strategy};
pub use crate::errors::FocstestError;
pub use crate::repl::{DriverError, Interpreter, Repl, ReplDriver};
pub use crate::test::runner::{RunConfig, RunListener, RunSummary, SuiteRunner, SuiteSelection};
pub use crate::test::{SourcePosition, TestCase, TestOutcome, TestSuite};

pub mod classify;
pub mod cli;
pub mod compare;
pub mod errors;
pub mod fetch;
pub mod html;
pub mod logging;
pub mod repl;
pub mod syntax;
pub mod transcript;
