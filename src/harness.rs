//! End-to-end orchestration: load every input file, run, report.

use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use termcolor::WriteColor;
use tracing::info;

use crate::config::{is_script, RunConfig};
use crate::description::{IdSequence, Outcome, TestDescription};
use crate::discovery::DirSource;
use crate::dsl::Loader;
use crate::errors::HarnessError;
use crate::parser::parse_preprocessed;
use crate::preprocess::Preprocessor;
use crate::report::Reporter;
use crate::runner::{Executor, RunSummary, Runner};

/// Loads tests from every file in order, with ids unique across all of them.
///
/// YAML files are evaluated as scripts; everything else is preprocessed and
/// parsed line by line.
pub fn load_tests(
    files: &[PathBuf],
    dirs: &dyn DirSource,
) -> Result<Vec<TestDescription>, HarnessError> {
    let mut ids = IdSequence::new();
    let mut tests = Vec::new();
    let preprocessor = Preprocessor::new(dirs);

    for file in files {
        if is_script(file) {
            let mut loader = Loader::new(&mut ids, dirs);
            loader.load_script_file(file)?;
            if loader.skipped() > 0 {
                info!(file = %file.display(), skipped = loader.skipped(), "skipped tests");
            }
            tests.extend(loader.finish());
        } else {
            let preprocessed = preprocessor.process_file(file)?;
            tests.extend(parse_preprocessed(&preprocessed, &mut ids)?);
        }
        info!(file = %file.display(), total = tests.len(), "loaded test file");
    }
    Ok(tests)
}

/// Runs `tests` through `executor` and writes the summary to `report`.
pub fn run_and_report(
    tests: Vec<TestDescription>,
    config: &RunConfig,
    executor: &mut dyn Executor,
    report: &mut dyn WriteColor,
    log: &mut dyn Write,
) -> Result<RunSummary, HarnessError> {
    let started = Local::now();
    let summary = Runner::new(executor, log)
        .with_program(config.tool.clone())
        .with_extra_args(config.tool_args.clone())
        .run(tests)?;
    Reporter::new(report).summary(&summary.stats, started, summary.elapsed)?;
    Ok(summary)
}

/// Process status for a completed run: non-zero only if something failed
/// that was expected to pass.
pub fn exit_code(summary: &RunSummary) -> i32 {
    if summary.stats.get(Outcome::Fail) > 0 {
        1
    } else {
        0
    }
}
