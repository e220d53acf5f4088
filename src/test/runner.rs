use std::collections::BTreeSet;

use log::{debug, info};

use crate::compare;
use crate::repl::{DriverError, Repl};
use crate::test::{TestCase, TestOutcome, TestSuite};

/// Which suites a run executes, by their 1-based number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SuiteSelection {
    #[default]
    All,
    /// Run only these suites.
    Only(BTreeSet<usize>),
    /// Run every suite except these.
    Skip(BTreeSet<usize>),
}

impl SuiteSelection {
    pub fn includes(&self, number: usize) -> bool {
        match self {
            SuiteSelection::All => true,
            SuiteSelection::Only(numbers) => numbers.contains(&number),
            SuiteSelection::Skip(numbers) => !numbers.contains(&number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Skip the rest of a suite once one of its tests is unimplemented.
    pub skip_unimplemented_suites: bool,
    pub selection: SuiteSelection,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            skip_unimplemented_suites: true,
            selection: SuiteSelection::All,
        }
    }
}

/// Test counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_run: usize,
    pub total_failed: usize,
    pub total_skipped: usize,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.total_failed > 0
    }

    pub fn total_passed(&self) -> usize {
        self.total_run - self.total_failed
    }
}

/// A suite and its number in extraction order.
#[derive(Debug, Clone, Copy)]
pub struct SuiteContext<'a> {
    pub number: usize,
    pub suite: &'a TestSuite,
}

impl SuiteContext<'_> {
    pub fn description(&self) -> String {
        format!("suite {} ({:?})", self.number, self.suite.function())
    }
}

/// A test, its 1-based number in its suite, and the suite.
#[derive(Debug, Clone, Copy)]
pub struct TestContext<'a> {
    pub suite: SuiteContext<'a>,
    pub number: usize,
    pub test: &'a TestCase,
}

impl TestContext<'_> {
    pub fn description(&self) -> String {
        format!(
            "test {} of {} in {}",
            self.number,
            self.suite.suite.len(),
            self.suite.description()
        )
    }
}

/// Receives the lifecycle events of a run. Every method defaults to doing nothing.
pub trait RunListener {
    /// Called once before the first suite.
    fn on_start(&mut self) {}

    /// Called once after the last suite, with the final counts.
    fn on_complete(&mut self, _summary: &RunSummary) {}

    fn on_suite_start(&mut self, _suite: &SuiteContext<'_>) {}

    fn on_suite_complete(&mut self, _suite: &SuiteContext<'_>) {}

    fn on_test_start(&mut self, _test: &TestContext<'_>) {}

    /// Called when a test cannot be evaluated and will be skipped.
    fn on_test_error(&mut self, _test: &TestContext<'_>, _error: &DriverError) {}

    /// Called when a test hits unimplemented code and will be skipped.
    /// `skipping_suite` is set when the rest of the suite is skipped with it.
    fn on_test_unimplemented(&mut self, _test: &TestContext<'_>, _skipping_suite: bool) {}

    /// Called after a test ran, passed or failed.
    fn on_test_complete(&mut self, _test: &TestContext<'_>, _outcome: &TestOutcome) {}
}

/// A listener that ignores every event.
impl RunListener for () {}

/// Runs numbered test suites through a [`Repl`].
pub struct SuiteRunner<R> {
    suites: Vec<(usize, TestSuite)>,
    repl: R,
    config: RunConfig,
    summary: RunSummary,
}

impl<R: Repl> SuiteRunner<R> {
    /// Numbers `suites` from 1 in the order given.
    pub fn new(suites: impl IntoIterator<Item = TestSuite>, repl: R, config: RunConfig) -> Self {
        Self {
            suites: suites
                .into_iter()
                .enumerate()
                .map(|(i, suite)| (i + 1, suite))
                .collect(),
            repl,
            config,
            summary: RunSummary::default(),
        }
    }

    pub fn suites(&self) -> &[(usize, TestSuite)] {
        &self.suites
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn total_tests(&self) -> usize {
        self.suites.iter().map(|(_, suite)| suite.len()).sum()
    }

    /// Runs the selected suites in order.
    ///
    /// Deselected suites count as skipped without running. Tests that cannot
    /// be evaluated and unimplemented tests are skipped too.
    ///
    /// # Errors
    /// Any [`DriverError`] that is not skippable stops the run, most notably
    /// [`DriverError::FileLoad`] when the file under test is broken.
    pub fn run<L: RunListener + ?Sized>(&mut self, listener: &mut L) -> Result<RunSummary, DriverError> {
        self.summary = RunSummary::default();

        let mut selected = Vec::new();
        for (number, suite) in &self.suites {
            if self.config.selection.includes(*number) {
                selected.push((*number, suite));
            } else {
                debug!("Skipping suite {} ({} tests)", number, suite.len());
                self.summary.total_skipped += suite.len();
            }
        }

        listener.on_start();

        for (number, suite) in selected {
            let suite_ctx = SuiteContext { number, suite };
            listener.on_suite_start(&suite_ctx);

            for (index, test) in suite.iter().enumerate() {
                let test_ctx = TestContext {
                    suite: suite_ctx,
                    number: index + 1,
                    test,
                };
                listener.on_test_start(&test_ctx);

                let output = match self.repl.evaluate(&test.input) {
                    Ok(output) => output,
                    Err(e) if e.is_skippable() => {
                        debug!("Skipping {}: {}", test_ctx.description(), e);
                        listener.on_test_error(&test_ctx, &e);
                        self.summary.total_skipped += 1;
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                let outcome = compare::evaluate(&test.input, output, &test.expected);

                if outcome.is_unimplemented() {
                    let skip_suite = self.config.skip_unimplemented_suites;
                    listener.on_test_unimplemented(&test_ctx, skip_suite);
                    self.summary.total_skipped += 1;

                    if skip_suite {
                        self.summary.total_skipped += suite.len() - test_ctx.number;
                        break;
                    }
                    continue;
                }

                listener.on_test_complete(&test_ctx, &outcome);
                if !outcome.success {
                    self.summary.total_failed += 1;
                }
                self.summary.total_run += 1;
            }

            listener.on_suite_complete(&suite_ctx);
        }

        info!(
            "Ran {} tests: {} failed, {} skipped",
            self.summary.total_run, self.summary.total_failed, self.summary.total_skipped
        );
        listener.on_complete(&self.summary);
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite(inputs: &[&str]) -> TestSuite {
        TestSuite::new(
            inputs.iter().map(|input| TestCase::new(*input, "ok")).collect(),
            None,
        )
    }

    fn echo_ok(_: &str) -> Result<String, DriverError> {
        Ok("ok".to_string())
    }

    #[test]
    fn test_selection_includes() {
        let only = SuiteSelection::Only([2, 4].into_iter().collect());
        assert!(only.includes(2));
        assert!(!only.includes(3));
        let skip = SuiteSelection::Skip([2].into_iter().collect());
        assert!(!skip.includes(2));
        assert!(skip.includes(3));
        assert!(SuiteSelection::All.includes(99));
    }

    #[test]
    fn test_suites_are_numbered_from_one() {
        let runner = SuiteRunner::new(vec![suite(&["a;;"]), suite(&["b;;", "c;;"])], echo_ok, RunConfig::default());
        let numbers: Vec<_> = runner.suites().iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(runner.total_tests(), 3);
    }

    #[test]
    fn test_all_pass() {
        let mut runner = SuiteRunner::new(vec![suite(&["a;;", "b;;"])], echo_ok, RunConfig::default());
        let summary = runner.run(&mut ()).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                total_run: 2,
                total_failed: 0,
                total_skipped: 0
            }
        );
        assert_eq!(summary.total_passed(), 2);
        assert!(!summary.has_failures());
    }

    #[test]
    fn test_rerun_resets_counts() {
        let mut runner = SuiteRunner::new(vec![suite(&["a;;"])], echo_ok, RunConfig::default());
        runner.run(&mut ()).unwrap();
        let summary = runner.run(&mut ()).unwrap();
        assert_eq!(summary.total_run, 1);
        assert_eq!(runner.summary(), &summary);
    }

    #[test]
    fn test_description() {
        let s = suite(&["sum [1];;", "sum [];;"]);
        let suite_ctx = SuiteContext { number: 3, suite: &s };
        let test_ctx = TestContext {
            suite: suite_ctx,
            number: 2,
            test: &s.tests[1],
        };
        assert_eq!(test_ctx.description(), "test 2 of 2 in suite 3 (\"sum\")");
    }
}
