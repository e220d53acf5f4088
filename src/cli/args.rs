//! Defines the command-line arguments for focstest.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::fetch::{self, PageSource};
use crate::test::runner::SuiteSelection;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "focstest",
    version,
    about = "Run ocaml \"doctests\".",
    after_help = "Submit bugs to <https://github.com/olin/focstest/issues/>."
)]
pub struct FocstestArgs {
    /// A url to scrape tests from (usually automagically guessed from OCAML_FILE)
    #[arg(long, value_parser = valid_url, conflicts_with = "html_file")]
    pub url: Option<Url>,

    /// A local html file to scrape tests from
    #[arg(long = "from-html", value_name = "FILE", value_parser = existing_file)]
    pub html_file: Option<PathBuf>,

    /// The ocaml file to test against
    #[arg(value_parser = existing_file)]
    pub ocaml_file: PathBuf,

    /// Increase test output verbosity
    #[arg(short, long)]
    pub verbose: bool,

    /// Ignore cached files
    #[arg(long)]
    pub ignore_cache: bool,

    /// Seconds a single test may run before the run is aborted
    #[arg(short, long, value_name = "SECS", value_parser = timeout_secs, default_value = "5")]
    pub timeout: Duration,

    /// Test suites to use exclusively, indexed from 1
    #[arg(short, long, value_name = "N", num_args = 1.., conflicts_with = "skip_suites")]
    pub use_suites: Vec<usize>,

    /// Test suites to skip, indexed from 1
    #[arg(short, long, value_name = "N", num_args = 1..)]
    pub skip_suites: Vec<usize>,
}

impl FocstestArgs {
    pub fn selection(&self) -> SuiteSelection {
        if !self.use_suites.is_empty() {
            SuiteSelection::Only(self.use_suites.iter().copied().collect::<BTreeSet<_>>())
        } else if !self.skip_suites.is_empty() {
            SuiteSelection::Skip(self.skip_suites.iter().copied().collect::<BTreeSet<_>>())
        } else {
            SuiteSelection::All
        }
    }

    pub fn page_source(&self) -> PageSource {
        match (&self.url, &self.html_file) {
            (Some(url), _) => PageSource::Url(url.clone()),
            (None, Some(file)) => PageSource::File(file.clone()),
            (None, None) => PageSource::Infer,
        }
    }
}

fn existing_file(p: &str) -> Result<PathBuf, String> {
    let file = PathBuf::from(p);
    if !file.exists() {
        return Err(format!("path {:?} does not exist", p));
    }
    if !file.is_file() {
        return Err(format!("path {:?} is not a file", p));
    }
    Ok(file)
}

fn valid_url(u: &str) -> Result<Url, String> {
    fetch::parse_url(u).ok_or_else(|| format!("url {:?} has no domain", u))
}

fn timeout_secs(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|_| format!("{:?} is not a number of seconds", s))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("timeout must be positive, got {}", secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("timeout {} is out of range: {}", s, e))
}
