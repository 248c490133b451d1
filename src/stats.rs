//! Run-scoped outcome tallies.

use std::collections::HashSet;

use crate::description::{Outcome, TestDescription};
use crate::errors::HarnessError;

/// Counters and recorded tests for one run.
///
/// `count` always equals the sum of the four outcome counters, and every
/// recorded test lands in exactly one of `failures` / `successes`.
#[derive(Debug, Default, Clone)]
pub struct Stats {
    pass: usize,
    fail: usize,
    xpass: usize,
    xfail: usize,
    count: usize,
    results: Vec<TestDescription>,
    failures: Vec<TestDescription>,
    successes: Vec<TestDescription>,
    seen: HashSet<usize>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `outcome` for `test`. A test id may only be recorded once.
    pub fn record(
        &mut self,
        mut test: TestDescription,
        outcome: Outcome,
    ) -> Result<(), HarnessError> {
        if !self.seen.insert(test.id()) || !test.set_result(outcome) {
            return Err(HarnessError::AlreadyRecorded { id: test.id() });
        }

        *self.counter_mut(outcome) += 1;
        self.count += 1;

        if outcome.is_failure() {
            self.failures.push(test.clone());
        } else {
            self.successes.push(test.clone());
        }
        self.results.push(test);
        Ok(())
    }

    fn counter_mut(&mut self, outcome: Outcome) -> &mut usize {
        match outcome {
            Outcome::Pass => &mut self.pass,
            Outcome::Fail => &mut self.fail,
            Outcome::XPass => &mut self.xpass,
            Outcome::XFail => &mut self.xfail,
        }
    }

    pub fn get(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::Pass => self.pass,
            Outcome::Fail => self.fail,
            Outcome::XPass => self.xpass,
            Outcome::XFail => self.xfail,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// All recorded tests, in arrival order.
    pub fn results(&self) -> &[TestDescription] {
        &self.results
    }

    /// Tests classified `FAIL` or `XFAIL`.
    pub fn failures(&self) -> &[TestDescription] {
        &self.failures
    }

    /// Tests classified `PASS` or `XPASS`.
    pub fn successes(&self) -> &[TestDescription] {
        &self.successes
    }
}
