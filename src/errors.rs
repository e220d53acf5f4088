//! Errors that stop a focstest run.
//!
//! Per-test problems never surface here: the runner skips or reports them.
//! These are the failures a user has to fix before anything can be tested.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::classify::ReplError;
use crate::repl::DriverError;

/// `EX_NOINPUT` from sysexits.h.
pub const EXIT_NO_INPUT: i32 = 66;

const CONNECTION_HINT: &str = "Your internet connection may be down, or the website may not exist";

#[derive(Error, Diagnostic, Debug)]
pub enum FocstestError {
    #[error("Unable to infer FoCS homework url from OCaml filename {:?}", .ocaml_file.display().to_string())]
    #[diagnostic(
        code(focstest::input::url_inference),
        help("Specify a url (with --url) or a local html file (with --from-html)")
    )]
    UrlInference { ocaml_file: PathBuf },

    #[error("Error accessing {description} {:?}", .path.display().to_string())]
    #[diagnostic(code(focstest::input::read))]
    InputFile {
        description: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error fetching url {url:?}: {reason}")]
    #[diagnostic(code(focstest::fetch))]
    Fetch {
        url: String,
        reason: String,
        #[help]
        hint: Option<String>,
    },

    #[error("OCaml returned an error while loading {:?}", .file.display().to_string())]
    #[diagnostic(code(focstest::repl::file_load), help("Fix the error to continue"))]
    FileLoad {
        file: PathBuf,
        #[source]
        source: ReplError,
    },

    #[error(transparent)]
    #[diagnostic(code(focstest::repl))]
    Repl(DriverError),
}

impl FocstestError {
    /// Wraps a failed request, suggesting a fix when the server was never reached.
    pub fn fetch(url: impl ToString, error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(status, response) => FocstestError::Fetch {
                url: url.to_string(),
                reason: format!("{} {}", status, response.status_text()),
                hint: None,
            },
            ureq::Error::Transport(transport) => FocstestError::Fetch {
                url: url.to_string(),
                reason: transport.to_string(),
                hint: Some(CONNECTION_HINT.to_string()),
            },
        }
    }

    /// The process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            FocstestError::InputFile { .. } => EXIT_NO_INPUT,
            _ => 1,
        }
    }
}

impl From<DriverError> for FocstestError {
    fn from(error: DriverError) -> Self {
        match error {
            DriverError::FileLoad { file, source } => FocstestError::FileLoad { file, source },
            other => FocstestError::Repl(other),
        }
    }
}
