//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;

use focstest::repl::DriverError;
use focstest::test::runner::{RunListener, RunSummary, SuiteContext, TestContext};
use focstest::{Interpreter, TestCase, TestOutcome, TestSuite};

pub const NOT_IMPLEMENTED: &str = "Exception: Failure \"Not implemented\".";

/// A suite whose tests all expect `"ok"`.
pub fn suite_of(inputs: &[&str]) -> TestSuite {
    TestSuite::new(inputs.iter().map(|input| TestCase::new(*input, "ok")).collect(), None)
}

/// A fake toplevel answering from a fixed table; unknown statements print `ok`.
pub fn scripted_repl(answers: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, DriverError> {
    let answers: HashMap<String, String> = answers
        .iter()
        .map(|(input, output)| (input.to_string(), output.to_string()))
        .collect();
    move |statement: &str| Ok(answers.get(statement).cloned().unwrap_or_else(|| "ok".to_string()))
}

/// An interpreter that ignores its input and prints `stdout`.
#[cfg(unix)]
pub fn printing_interpreter(stdout: &str) -> Interpreter {
    let script = format!("cat >/dev/null; printf '%s' '{}'", stdout.replace('\'', r"'\''"));
    Interpreter::new("sh", ["-c".to_string(), script])
}

/// Records every listener callback as a line of text.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Vec<String>,
}

impl RunListener for RecordingListener {
    fn on_start(&mut self) {
        self.events.push("start".into());
    }

    fn on_complete(&mut self, summary: &RunSummary) {
        self.events.push(format!(
            "complete run={} failed={} skipped={}",
            summary.total_run, summary.total_failed, summary.total_skipped
        ));
    }

    fn on_suite_start(&mut self, suite: &SuiteContext<'_>) {
        self.events.push(format!("suite {}", suite.number));
    }

    fn on_suite_complete(&mut self, suite: &SuiteContext<'_>) {
        self.events.push(format!("end suite {}", suite.number));
    }

    fn on_test_error(&mut self, test: &TestContext<'_>, _error: &DriverError) {
        self.events.push(format!("error {}", test.test.input));
    }

    fn on_test_unimplemented(&mut self, test: &TestContext<'_>, skipping_suite: bool) {
        self.events.push(format!("unimplemented {} skip_suite={}", test.test.input, skipping_suite));
    }

    fn on_test_complete(&mut self, test: &TestContext<'_>, outcome: &TestOutcome) {
        let verdict = if outcome.success { "pass" } else { "fail" };
        self.events.push(format!("{} {}", verdict, test.test.input));
    }
}
