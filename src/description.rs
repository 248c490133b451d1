//! Test descriptions and the outcome vocabulary shared by every stage.
//!
//! A [`TestDescription`] is created once at discovery time (by the line parser
//! or the DSL loader) and is immutable afterwards except for its observed
//! [`Outcome`], which the runner sets exactly once.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

// ============================================================================
// EXPECTATIONS AND OUTCOMES
// ============================================================================

/// The outcome a test description declares up front.
///
/// Only `PASS` and `XFAIL` may be declared; `FAIL` and `XPASS` are observed
/// outcomes and are rejected when they appear in the expected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum Expectation {
    #[default]
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "XFAIL")]
    XFail,
}

impl Expectation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Expectation::Pass => "PASS",
            Expectation::XFail => "XFAIL",
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason an expected-column token could not be turned into an [`Expectation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectationParseError {
    /// A real outcome name that is not declarable (`FAIL`, `XPASS`).
    NotDeclarable(Outcome),
    /// Anything else.
    Unknown(String),
}

impl FromStr for Expectation {
    type Err = ExpectationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PASS" => Ok(Expectation::Pass),
            "XFAIL" => Ok(Expectation::XFail),
            "FAIL" => Err(ExpectationParseError::NotDeclarable(Outcome::Fail)),
            "XPASS" => Err(ExpectationParseError::NotDeclarable(Outcome::XPass)),
            other => Err(ExpectationParseError::Unknown(other.to_string())),
        }
    }
}

/// The observed classification of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Pass,
    Fail,
    XPass,
    XFail,
}

impl Outcome {
    /// All outcomes in report order.
    pub const ALL: [Outcome; 4] = [Outcome::Pass, Outcome::Fail, Outcome::XPass, Outcome::XFail];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Fail => "FAIL",
            Outcome::XPass => "XPASS",
            Outcome::XFail => "XFAIL",
        }
    }

    /// True for outcomes listed under FAILURES (`FAIL` and `XFAIL`).
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Fail | Outcome::XFail)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ID SEQUENCE
// ============================================================================

/// Hands out 1-based, strictly increasing test ids.
///
/// One sequence is owned by a run and threaded through every loader call so
/// ids stay unique across all input files.
#[derive(Debug)]
pub struct IdSequence {
    next: usize,
}

impl IdSequence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next id and advances the sequence.
    pub fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to [`IdSequence::next_id`] will return.
    pub fn peek(&self) -> usize {
        self.next
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TEST DESCRIPTION
// ============================================================================

/// One unit of work: a subject path, the arguments forwarded to the tool, and
/// the declared expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDescription {
    id: usize,
    path: String,
    args: String,
    expected: Expectation,
    comment: String,
    result: Option<Outcome>,
}

impl TestDescription {
    pub fn new(
        id: usize,
        path: impl Into<String>,
        args: impl Into<String>,
        expected: Expectation,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            args: args.into(),
            expected,
            comment: comment.into(),
            result: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn expected(&self) -> Expectation {
        self.expected
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// The observed outcome, once the runner has classified this test.
    pub fn result(&self) -> Option<Outcome> {
        self.result
    }

    /// Stores the observed outcome. Returns false (and keeps the first value)
    /// if an outcome was already recorded.
    pub fn set_result(&mut self, outcome: Outcome) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.result = Some(outcome);
        true
    }

    /// Report line: `id|path|args|comment --- OUTCOME`.
    pub fn result_line(&self) -> String {
        let outcome = self.result.map(|o| o.as_str()).unwrap_or("UNRUN");
        format!(
            "{}|{}|{}|{} --- {}",
            self.id, self.path, self.args, self.comment, outcome
        )
    }
}

impl fmt::Display for TestDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}",
            self.id, self.path, self.args, self.expected, self.comment
        )
    }
}
