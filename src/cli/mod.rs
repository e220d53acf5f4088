//! The focstest command-line interface.
//!
//! This module is the main entry point for the binary and wires the page
//! source, the transcript parser, the toplevel driver and the runner together.

use std::process;

use clap::Parser;
use log::{debug, info};

use crate::cli::args::FocstestArgs;
use crate::errors::FocstestError;
use crate::fetch::{self, FetchConfig};
use crate::repl::ReplDriver;
use crate::test::runner::{RunConfig, RunListener, RunSummary, SuiteRunner};
use crate::{logging, transcript};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    logging::init();
    let args = FocstestArgs::parse();

    let mut listener = output::stdout_listener(args.verbose);
    match focstest(&args, &mut listener) {
        Ok(summary) if summary.has_failures() => process::exit(1),
        Ok(_) => {}
        Err(e) => {
            let code = e.exit_code();
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(code);
        }
    }
}

/// Runs the tests for `args.ocaml_file`, reporting progress to `listener`.
///
/// # Errors
/// Fails if the page cannot be loaded or the file under test does not load
/// cleanly in the toplevel.
pub fn focstest<L: RunListener + ?Sized>(args: &FocstestArgs, listener: &mut L) -> Result<RunSummary, FocstestError> {
    let fetch_config = FetchConfig {
        use_cache: !args.ignore_cache,
        ..FetchConfig::default()
    };
    let page = fetch::load_page(&args.ocaml_file, args.page_source(), &fetch_config)?;

    let suites = transcript::parse_html_tests(&page.html, Some(&page.path));
    let driver = ReplDriver::new(vec![args.ocaml_file.clone()]).with_timeout(args.timeout);
    let config = RunConfig {
        selection: args.selection(),
        ..RunConfig::default()
    };
    let mut runner = SuiteRunner::new(suites, driver, config);
    info!(
        "Found {} test suites and {} tests total",
        runner.suites().len(),
        runner.total_tests()
    );

    debug!("Starting tests");
    let summary = runner.run(listener)?;
    debug!("Finished testing");
    Ok(summary)
}
