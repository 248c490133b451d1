//! Sequential execution and outcome classification.
//!
//! Each test is turned into an [`Invocation`] of the external tool and handed
//! to an [`Executor`]. The exit status is classified against the test's
//! declared expectation; any status other than success or the designated
//! failure code aborts the run.

use std::fmt;
use std::io::Write;
use std::process::Command;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::description::{Expectation, Outcome, TestDescription};
use crate::errors::HarnessError;
use crate::stats::Stats;

/// Tool-level success.
pub const EXIT_SUCCESS: i32 = 0;
/// Tool-level designated failure.
pub const EXIT_FAILURE: i32 = 99;

/// The tool the harness drives unless told otherwise.
pub const DEFAULT_TOOL: &str = "rt";

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Maps an exit status and a declared expectation to an outcome.
///
/// | status | PASS  | XFAIL |
/// |--------|-------|-------|
/// | 0      | PASS  | XPASS |
/// | 99     | FAIL  | XFAIL |
///
/// Any other status, including termination by signal, yields `None`.
pub fn classify(status: Option<i32>, expected: Expectation) -> Option<Outcome> {
    match (status?, expected) {
        (EXIT_SUCCESS, Expectation::Pass) => Some(Outcome::Pass),
        (EXIT_SUCCESS, Expectation::XFail) => Some(Outcome::XPass),
        (EXIT_FAILURE, Expectation::Pass) => Some(Outcome::Fail),
        (EXIT_FAILURE, Expectation::XFail) => Some(Outcome::XFail),
        _ => None,
    }
}

// ============================================================================
// EXECUTION PORT
// ============================================================================

/// A fully built tool command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// `program --chow-args=<args> --test=<path> --exit-on-failure <extra>...`
    pub fn for_test(program: &str, test: &TestDescription, extra: &[String]) -> Self {
        let mut args = vec![
            format!("--chow-args={}", test.args()),
            format!("--test={}", test.path()),
            "--exit-on-failure".to_string(),
        ];
        args.extend(extra.iter().cloned());
        Self {
            program: program.to_string(),
            args,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    write!(f, " {flag}=\"{value}\"")?
                }
                _ => write!(f, " {arg}")?,
            }
        }
        Ok(())
    }
}

/// What came back from one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub status: Option<i32>,
    /// Standard output followed by standard error.
    pub output: String,
}

/// Runs an invocation to completion.
pub trait Executor {
    fn execute(&mut self, invocation: &Invocation) -> Result<Execution, HarnessError>;
}

/// Runs the tool as a child process, without a shell, blocking until it exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(&mut self, invocation: &Invocation) -> Result<Execution, HarnessError> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|e| HarnessError::Spawn {
                program: invocation.program.clone(),
                source: e,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(Execution {
            status: output.status.code(),
            output: text,
        })
    }
}

// ============================================================================
// RUNNER
// ============================================================================

/// Statistics plus timing for a completed run.
#[derive(Debug)]
pub struct RunSummary {
    pub stats: Stats,
    pub elapsed: Duration,
}

/// Drives tests through an executor one at a time.
pub struct Runner<'a> {
    executor: &'a mut dyn Executor,
    program: String,
    extra_args: Vec<String>,
    log: &'a mut dyn Write,
}

impl<'a> Runner<'a> {
    pub fn new(executor: &'a mut dyn Executor, log: &'a mut dyn Write) -> Self {
        Self {
            executor,
            program: DEFAULT_TOOL.to_string(),
            extra_args: Vec::new(),
            log,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments appended to every invocation.
    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    /// Runs every test in order and returns the accumulated statistics.
    pub fn run(&mut self, tests: Vec<TestDescription>) -> Result<RunSummary, HarnessError> {
        writeln!(self.log, "STARTING TEST RUN")?;
        writeln!(self.log, "{}", chrono::Local::now())?;
        info!(tests = tests.len(), tool = %self.program, "starting test run");

        let timer = Instant::now();
        let mut stats = Stats::new();
        for test in tests {
            let outcome = self.run_one(&test)?;
            stats.record(test, outcome)?;
        }
        let elapsed = timer.elapsed();

        writeln!(self.log, "tests completed in {}", format_elapsed(elapsed))?;
        self.log.flush()?;
        info!(count = stats.count(), elapsed = ?elapsed, "test run complete");
        Ok(RunSummary { stats, elapsed })
    }

    fn run_one(&mut self, test: &TestDescription) -> Result<Outcome, HarnessError> {
        let invocation = Invocation::for_test(&self.program, test, &self.extra_args);
        writeln!(self.log, "**** Running Test {} ****", test.id())?;
        writeln!(self.log, "{invocation}")?;
        debug!(id = test.id(), command = %invocation, "executing");

        let execution = self.executor.execute(&invocation)?;
        let status = match execution.status {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        };
        writeln!(self.log, "test script exited with status: {status}")?;
        writeln!(self.log, "{}", execution.output.trim_end())?;

        let outcome = classify(execution.status, test.expected()).ok_or_else(|| {
            HarnessError::UnresolvedStatus {
                id: test.id(),
                status: execution.status,
                command: invocation.to_string(),
            }
        })?;
        writeln!(self.log, "**** TEST FINISHED WITH STATUS: {outcome} ****")?;
        debug!(id = test.id(), %outcome, "classified");
        Ok(outcome)
    }
}

/// `M minutes S.SS seconds`, minutes rounded down.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    let minutes = (secs / 60.0).floor();
    format!("{:.0} minutes {:.2} seconds", minutes, secs - minutes * 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table_is_exact() {
        assert_eq!(classify(Some(0), Expectation::Pass), Some(Outcome::Pass));
        assert_eq!(classify(Some(0), Expectation::XFail), Some(Outcome::XPass));
        assert_eq!(classify(Some(99), Expectation::Pass), Some(Outcome::Fail));
        assert_eq!(classify(Some(99), Expectation::XFail), Some(Outcome::XFail));
    }

    #[test]
    fn other_statuses_are_unresolved() {
        for status in [Some(1), Some(2), Some(98), Some(100), Some(-1), None] {
            assert_eq!(classify(status, Expectation::Pass), None);
            assert_eq!(classify(status, Expectation::XFail), None);
        }
    }

    #[test]
    fn invocation_carries_fixed_flags_then_extras() {
        let test = TestDescription::new(1, "cases/a", "-r 8", Expectation::Pass, "");
        let invocation = Invocation::for_test("rt", &test, &["--keep".to_string()]);
        assert_eq!(
            invocation.args,
            vec!["--chow-args=-r 8", "--test=cases/a", "--exit-on-failure", "--keep"]
        );
        assert_eq!(
            invocation.to_string(),
            "rt --chow-args=\"-r 8\" --test=\"cases/a\" --exit-on-failure --keep"
        );
    }

    #[test]
    fn elapsed_is_minutes_and_seconds() {
        assert_eq!(
            format_elapsed(Duration::from_millis(90_500)),
            "1 minutes 30.50 seconds"
        );
        assert_eq!(format_elapsed(Duration::ZERO), "0 minutes 0.00 seconds");
    }
}
