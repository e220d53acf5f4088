//! Runs statements in a fresh OCaml toplevel and isolates their output.
//!
//! The toplevel is driven non-interactively: the whole session is written to
//! its stdin at once and the output is read after it exits. Before reading
//! each statement the toplevel prints its prompt, so splitting stdout on the
//! prompt yields one segment per command:
//!
//! ```text
//! startup banner | #use output ... | statement output | #quit trailer
//! ```

use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use log::debug;
use thiserror::Error;

use crate::classify::{classify, ReplError};
use crate::syntax::{PROMPT, TERMINATOR};

mod process;

/// How long one toplevel session may run before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const QUIT: &str = "#quit;;\n";

/// Failures of a single statement run.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("code is not a complete ocaml expression: {statement:?}")]
    IncompleteStatement { statement: String },

    #[error("couldn't evaluate code {statement:?}: {tail:?}")]
    Unevaluable { statement: String, tail: String },

    #[error("OCaml returned an error while loading {}", .file.display())]
    FileLoad {
        file: PathBuf,
        #[source]
        source: ReplError,
    },

    #[error("the interpreter did not finish within {timeout:?} while running {statement:?}")]
    Timeout { statement: String, timeout: Duration },

    #[error("failed to start the interpreter {program:?}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while talking to the interpreter")]
    Io(#[from] io::Error),
}

impl DriverError {
    /// Whether the statement alone is at fault, so the run can go on without it.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            DriverError::IncompleteStatement { .. } | DriverError::Unevaluable { .. }
        )
    }
}

/// Anything that can evaluate one statement and return its output.
pub trait Repl {
    fn evaluate(&self, statement: &str) -> Result<String, DriverError>;
}

impl<F> Repl for F
where
    F: Fn(&str) -> Result<String, DriverError>,
{
    fn evaluate(&self, statement: &str) -> Result<String, DriverError> {
        self(statement)
    }
}

/// The interpreter executable and its flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub program: String,
    pub args: Vec<String>,
}

impl Interpreter {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn spawn(&self) -> io::Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
    }
}

/// `-noinit` skips the user's init file and `-color never` keeps terminal
/// escapes out of the output.
impl Default for Interpreter {
    fn default() -> Self {
        Self::new("ocaml", ["-noinit", "-color", "never"])
    }
}

/// The output of one session, split and lined up with the commands sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedOutput<'a> {
    pub banner: &'a str,
    pub files: Vec<&'a str>,
    pub statement: &'a str,
    pub trailer: &'a str,
}

/// The session output did not split into one segment per command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected} output segments, found {found}")]
pub struct SegmentMismatch {
    pub expected: usize,
    pub found: usize,
    /// The raw last segment, which usually shows what went wrong.
    pub tail: String,
}

/// Segments expected for a session preloading `file_count` files: the
/// banner, one per file, the statement, and the quit trailer.
pub fn expected_segments(file_count: usize) -> usize {
    1 + file_count + 2
}

/// Splits session output on the prompt, trimming every segment.
pub fn split_segments(output: &str) -> Vec<&str> {
    output.split(PROMPT).map(str::trim).collect()
}

/// Lines the output segments up with the commands of a session.
pub fn align_segments(output: &str, file_count: usize) -> Result<AlignedOutput<'_>, SegmentMismatch> {
    let segments = split_segments(output);
    let expected = expected_segments(file_count);
    debug!("Found {} segments, expected {}", segments.len(), expected);

    match segments.as_slice() {
        [banner, files @ .., statement, trailer] if segments.len() == expected => Ok(AlignedOutput {
            banner: *banner,
            files: files.to_vec(),
            statement: *statement,
            trailer: *trailer,
        }),
        _ => Err(SegmentMismatch {
            expected,
            found: segments.len(),
            tail: segments.last().map(|s| s.to_string()).unwrap_or_default(),
        }),
    }
}

/// Runs statements in a fresh toplevel, preloading auxiliary files with `#use`.
#[derive(Debug, Clone)]
pub struct ReplDriver {
    interpreter: Interpreter,
    files: Vec<PathBuf>,
    timeout: Duration,
}

impl ReplDriver {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            interpreter: Interpreter::default(),
            files,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The full session sent to the toplevel for `statement`.
    pub fn script(&self, statement: &str) -> String {
        let mut commands: Vec<String> = self
            .files
            .iter()
            .map(|file| format!("#use \"{}\";;", file.display()))
            .collect();
        commands.push(statement.to_string());
        commands.push(QUIT.to_string());
        commands.join("\n")
    }

    /// Runs one statement and returns its output alone.
    ///
    /// # Errors
    /// * [`DriverError::IncompleteStatement`] if `statement` does not end with `;;`
    /// * [`DriverError::Unevaluable`] if the output cannot be lined up with the commands
    /// * [`DriverError::FileLoad`] if a preloaded file reports an error or exception
    /// * [`DriverError::Timeout`] if the toplevel outlives the timeout
    pub fn run(&self, statement: &str) -> Result<String, DriverError> {
        if !statement.trim_end().ends_with(TERMINATOR) {
            return Err(DriverError::IncompleteStatement {
                statement: statement.to_string(),
            });
        }

        let child = self.interpreter.spawn().map_err(|source| DriverError::Spawn {
            program: self.interpreter.program.clone(),
            source,
        })?;
        let captured = process::communicate(child, &self.script(statement), self.timeout)?;
        debug!(
            "Interpreter finished in {:?} (timed out: {})",
            captured.elapsed, captured.timed_out
        );
        if !captured.stderr.trim().is_empty() {
            debug!("Interpreter stderr: {:?}", captured.stderr);
        }
        if captured.timed_out {
            return Err(DriverError::Timeout {
                statement: statement.to_string(),
                timeout: self.timeout,
            });
        }

        let aligned = align_segments(&captured.stdout, self.files.len()).map_err(|mismatch| {
            DriverError::Unevaluable {
                statement: statement.to_string(),
                tail: mismatch.tail,
            }
        })?;

        // `#use` output still evaluates when the file is broken, so check it here
        for (file, output) in self.files.iter().zip(&aligned.files) {
            if let Some(source) = classify(output) {
                return Err(DriverError::FileLoad {
                    file: file.clone(),
                    source,
                });
            }
        }

        Ok(aligned.statement.to_string())
    }
}

impl Repl for ReplDriver {
    fn evaluate(&self, statement: &str) -> Result<String, DriverError> {
        self.run(statement)
    }
}
