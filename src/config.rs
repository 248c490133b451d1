//! Run configuration and output sinks.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use termcolor::{ColorChoice, NoColor, StandardStream, WriteColor};

use crate::errors::HarnessError;
use crate::runner::DEFAULT_TOOL;

/// When to colorize the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto | ColorMode::Never => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
        }
    }
}

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Test-description files (`.yaml`/`.yml` are scripts).
    pub files: Vec<PathBuf>,
    /// Report sink; stdout when unset.
    pub output: Option<PathBuf>,
    /// Diagnostic log sink; stderr when unset.
    pub logfile: Option<PathBuf>,
    /// Accepted for compatibility; reports are never mailed.
    pub mail_to: Option<String>,
    pub tool: String,
    /// Appended to every tool invocation.
    pub tool_args: Vec<String>,
    /// Print discovered tests instead of running them.
    pub list: bool,
    pub color: ColorMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            output: None,
            logfile: None,
            mail_to: None,
            tool: DEFAULT_TOOL.to_string(),
            tool_args: Vec::new(),
            list: false,
            color: ColorMode::default(),
        }
    }
}

impl RunConfig {
    /// Opens the report sink. Files are truncated and never colorized.
    pub fn open_report(&self) -> Result<Box<dyn WriteColor>, HarnessError> {
        match &self.output {
            Some(path) => Ok(Box::new(NoColor::new(create(path, "create report file")?))),
            None => Ok(Box::new(StandardStream::stdout(self.color.choice()))),
        }
    }

    /// Opens the diagnostic log sink.
    pub fn open_log(&self) -> Result<Box<dyn Write>, HarnessError> {
        match &self.logfile {
            Some(path) => Ok(Box::new(create(path, "create log file")?)),
            None => Ok(Box::new(io::stderr())),
        }
    }
}

fn create(path: &Path, operation: &'static str) -> Result<BufWriter<File>, HarnessError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| HarnessError::io(operation, path, e))
}

/// True if `path` should be evaluated as a YAML test script.
pub fn is_script(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml")
}
