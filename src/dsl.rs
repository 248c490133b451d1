//! Programmatic test loading.
//!
//! [`Loader`] exposes the two primitives test scripts are written against:
//! [`Loader::test`] declares one test and [`Loader::expand`] hands each leaf
//! directory under a path to a block. YAML scripts are evaluated through the
//! same primitives:
//!
//! ```yaml
//! - test: cases/spill
//!   expected: XFAIL
//!   comment: known broken
//! - expand: cases/suite
//!   each:
//!     args: "-r 8"
//!     skip: ["slow"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::description::{Expectation, IdSequence, TestDescription};
use crate::discovery::{leaf_directories, DirSource};
use crate::errors::HarnessError;

// ============================================================================
// OPTIONS
// ============================================================================

/// Options accepted by the `test` primitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestOptions {
    #[serde(default)]
    pub expected: Expectation,
    /// Path suffixes; a test whose path ends with any of them is skipped.
    #[serde(default)]
    pub skip: Vec<String>,
    #[serde(default)]
    pub args: String,
    #[serde(default)]
    pub comment: String,
}

impl TestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expected(mut self, expected: Expectation) -> Self {
        self.expected = expected;
        self
    }

    pub fn skip(mut self, pattern: impl Into<String>) -> Self {
        self.skip.push(pattern.into());
        self
    }

    pub fn args(mut self, args: impl Into<String>) -> Self {
        self.args = args.into();
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Returns the first skip pattern that matches `path`.
    pub fn skip_match(&self, path: &str) -> Option<&str> {
        self.skip
            .iter()
            .map(String::as_str)
            .find(|pattern| path.ends_with(*pattern))
    }
}

/// Options accepted by the `expand` primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandOptions {
    pub disabled: bool,
}

// ============================================================================
// LOADER
// ============================================================================

/// Accumulates test descriptions from primitive calls.
///
/// Ids come from the run's [`IdSequence`], so several loaders used one after
/// another keep ids unique. Skipped tests do not consume an id.
pub struct Loader<'a> {
    ids: &'a mut IdSequence,
    dirs: &'a dyn DirSource,
    tests: Vec<TestDescription>,
    skipped: usize,
}

impl<'a> Loader<'a> {
    pub fn new(ids: &'a mut IdSequence, dirs: &'a dyn DirSource) -> Self {
        Self {
            ids,
            dirs,
            tests: Vec::new(),
            skipped: 0,
        }
    }

    /// Declares a test. Returns its id, or `None` if a skip pattern matched.
    pub fn test(&mut self, path: impl Into<String>, options: &TestOptions) -> Option<usize> {
        let path = path.into();
        if let Some(pattern) = options.skip_match(&path) {
            info!(path = %path, pattern, "skipping test");
            self.skipped += 1;
            return None;
        }
        let id = self.ids.next_id();
        self.tests.push(TestDescription::new(
            id,
            path,
            options.args.clone(),
            options.expected,
            options.comment.clone(),
        ));
        Some(id)
    }

    /// Calls `block` once per leaf directory under `path`, unless disabled.
    /// Returns the number of leaves visited.
    pub fn expand<F>(
        &mut self,
        path: impl AsRef<Path>,
        options: ExpandOptions,
        mut block: F,
    ) -> Result<usize, HarnessError>
    where
        F: FnMut(&mut Self, &Path),
    {
        let path = path.as_ref();
        if options.disabled {
            debug!(path = %path.display(), "expansion disabled");
            return Ok(0);
        }
        let leaves = leaf_directories(self.dirs, path)?;
        for leaf in &leaves {
            block(self, leaf);
        }
        Ok(leaves.len())
    }

    /// Evaluates a YAML script read from `path`.
    pub fn load_script_file(&mut self, path: &Path) -> Result<(), HarnessError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::io("read test script", path, e))?;
        self.load_script(path, &source)
    }

    /// Evaluates a YAML script. `origin` names the script in errors.
    pub fn load_script(&mut self, origin: &Path, source: &str) -> Result<(), HarnessError> {
        let steps: Vec<ScriptStep> =
            serde_yaml::from_str(source).map_err(|e| HarnessError::Script {
                path: origin.to_path_buf(),
                source: e,
            })?;
        debug!(script = %origin.display(), steps = steps.len(), "evaluating test script");

        for step in steps {
            match step {
                ScriptStep::Test(step) => {
                    let options = step.options();
                    self.test(step.test, &options);
                }
                ScriptStep::Expand(step) => {
                    let each = step.each;
                    let options = ExpandOptions {
                        disabled: step.disabled,
                    };
                    self.expand(&step.expand, options, |loader, leaf| {
                        loader.test(leaf.display().to_string(), &each);
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Number of tests excluded by skip patterns so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn tests(&self) -> &[TestDescription] {
        &self.tests
    }

    pub fn finish(self) -> Vec<TestDescription> {
        self.tests
    }
}

// ============================================================================
// SCRIPT FORMAT
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptStep {
    Test(TestStep),
    Expand(ExpandStep),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TestStep {
    test: String,
    #[serde(default)]
    expected: Expectation,
    #[serde(default)]
    skip: Vec<String>,
    #[serde(default)]
    args: String,
    #[serde(default)]
    comment: String,
}

impl TestStep {
    fn options(&self) -> TestOptions {
        TestOptions {
            expected: self.expected,
            skip: self.skip.clone(),
            args: self.args.clone(),
            comment: self.comment.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExpandStep {
    expand: PathBuf,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    each: TestOptions,
}
