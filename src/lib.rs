//! Regression-test harness for the chow register allocator.
//!
//! Test-description files are macro-expanded, parsed into
//! [`TestDescription`]s, and run one at a time through an external tool whose
//! exit status is classified against each test's declared expectation.

pub use crate::description::{Expectation, IdSequence, Outcome, TestDescription};
pub use crate::errors::HarnessError;

pub mod cli;
pub mod config;
pub mod description;
pub mod discovery;
pub mod dsl;
pub mod errors;
pub mod harness;
pub mod parser;
pub mod preprocess;
pub mod report;
pub mod runner;
pub mod stats;
