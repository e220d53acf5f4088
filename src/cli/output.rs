//! Handles all user-facing output for the CLI.
//!
//! Test results are printed as the run progresses by [`PrintingListener`].
//! Colors are only used when stdout is a terminal.

use std::io::Write;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::repl::DriverError;
use crate::test::runner::{RunListener, RunSummary, SuiteContext, TestContext};
use crate::test::{TestCase, TestOutcome};

/// Printed between suites in verbose mode.
pub const SUITE_SEPARATOR: &str =
    "--------------------------------------------------------------------------------";

/// Colors for stdout, disabled when it is not a terminal.
pub fn color_choice() -> ColorChoice {
    if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// A listener printing to stdout.
pub fn stdout_listener(verbose: bool) -> PrintingListener<StandardStream> {
    PrintingListener::new(StandardStream::stdout(color_choice()), verbose)
}

/// Prints failures and the final counts; with `verbose`, every test.
pub struct PrintingListener<W> {
    out: W,
    verbose: bool,
}

impl<W: WriteColor> PrintingListener<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self { out, verbose }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn cprint(&mut self, color: Option<Color>, text: &str) {
        if let Some(color) = color {
            let _ = self.out.set_color(ColorSpec::new().set_fg(Some(color)));
        }
        let _ = writeln!(self.out, "{}", text);
        let _ = self.out.reset();
    }

    fn print_test(&mut self, test: &TestCase, outcome: &TestOutcome) {
        let lines = format_test_output(test, outcome, "  ");
        self.cprint(None, &lines);
    }

    fn print_diff(&mut self, expected: &str, output: &str) {
        let changeset = Changeset::new(expected, output, "\n");
        for diff in &changeset.diffs {
            match diff {
                Difference::Same(x) => self.cprint(None, &prefix_lines(" ", x)),
                Difference::Add(x) => self.cprint(Some(Color::Green), &prefix_lines("+", x)),
                Difference::Rem(x) => self.cprint(Some(Color::Red), &prefix_lines("-", x)),
            }
        }
    }
}

impl<W: WriteColor> RunListener for PrintingListener<W> {
    fn on_complete(&mut self, summary: &RunSummary) {
        let failed_color = if summary.has_failures() {
            Color::Red
        } else {
            Color::Green
        };
        self.cprint(
            Some(failed_color),
            &format!("{} of {} tests failed", summary.total_failed, summary.total_run),
        );
        let skipped_color = (summary.total_skipped > 0).then_some(Color::Yellow);
        self.cprint(skipped_color, &format!("{} tests skipped", summary.total_skipped));
    }

    fn on_suite_start(&mut self, suite: &SuiteContext<'_>) {
        if self.verbose {
            self.cprint(None, &format!("Testing suite {}", suite.number));
        }
    }

    fn on_suite_complete(&mut self, _suite: &SuiteContext<'_>) {
        if self.verbose {
            self.cprint(None, SUITE_SEPARATOR);
        }
    }

    fn on_test_error(&mut self, test: &TestContext<'_>, error: &DriverError) {
        self.cprint(
            Some(Color::Yellow),
            &format!("Unable to run test {:?}: {}", test.test.input, error),
        );
    }

    fn on_test_unimplemented(&mut self, test: &TestContext<'_>, skipping_suite: bool) {
        if self.verbose {
            self.cprint(Some(Color::Yellow), &format!("Unimplemented {}", test.description()));
            self.cprint(None, &test.test.input);
        }
        if skipping_suite {
            self.cprint(
                Some(Color::Yellow),
                &format!("Skipped unimplemented {}", test.suite.description()),
            );
        }
    }

    fn on_test_complete(&mut self, test: &TestContext<'_>, outcome: &TestOutcome) {
        if !outcome.success {
            self.cprint(Some(Color::Red), &format!("Failed {}", test.description()));
            self.print_test(test.test, outcome);
            if self.verbose {
                self.print_diff(&test.test.expected, &outcome.output);
            }
        } else if self.verbose {
            self.cprint(Some(Color::Green), &format!("Passed {}", test.description()));
            self.print_test(test.test, outcome);
            if let Some(strategy) = outcome.strategy {
                self.cprint(None, &format!("  MATCHED:\t{}", strategy));
            }
        }
    }
}

/// The INPUT/EXPECTED/OUTPUT block shown for a test.
pub fn format_test_output(test: &TestCase, outcome: &TestOutcome, indent: &str) -> String {
    [
        ("INPUT", test.input.as_str()),
        ("EXPECTED", test.expected.as_str()),
        ("OUTPUT", outcome.output.as_str()),
    ]
    .iter()
    .map(|(kind, value)| format!("{}{}:\t{:?}", indent, kind, value))
    .collect::<Vec<_>>()
    .join("\n")
}

fn prefix_lines(prefix: &str, text: &str) -> String {
    text.split('\n')
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}
