//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use regress::errors::HarnessError;
use regress::runner::{Execution, Executor, Invocation};

/// Executor that answers from a table instead of spawning processes.
///
/// Statuses are looked up by the test path carried in `--test=<path>`; paths
/// not in the table get `default_status`.
pub struct ScriptedExecutor {
    pub default_status: Option<i32>,
    pub statuses: HashMap<String, Option<i32>>,
    pub invocations: Vec<Invocation>,
}

impl ScriptedExecutor {
    pub fn always(status: i32) -> Self {
        Self {
            default_status: Some(status),
            statuses: HashMap::new(),
            invocations: Vec::new(),
        }
    }

    pub fn with(mut self, path: &str, status: Option<i32>) -> Self {
        self.statuses.insert(path.to_string(), status);
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.invocations.iter().map(|i| i.to_string()).collect()
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&mut self, invocation: &Invocation) -> Result<Execution, HarnessError> {
        self.invocations.push(invocation.clone());
        let path = invocation
            .args
            .iter()
            .find_map(|arg| arg.strip_prefix("--test="))
            .unwrap_or_default();
        let status = self
            .statuses
            .get(path)
            .copied()
            .unwrap_or(self.default_status);
        Ok(Execution {
            status,
            output: format!("ran {path}\n"),
        })
    }
}

/// Writes `contents` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Creates every directory in `dirs` under `root`.
pub fn make_dirs(root: &Path, dirs: &[&str]) {
    for dir in dirs {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
}
