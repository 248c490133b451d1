//! Command-line entry point.
//!
//! Parses arguments, opens the report and log sinks, loads every test file,
//! and either lists the tests or runs them. Fatal errors are rendered with
//! miette to the report sink.

use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use termcolor::WriteColor;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::{ColorMode, RunConfig};
use crate::discovery::OsDirSource;
use crate::errors::HarnessError;
use crate::harness::{exit_code, load_tests, run_and_report};
use crate::report::Reporter;
use crate::runner::{ProcessExecutor, DEFAULT_TOOL};

// ============================================================================
// CLI ARGUMENTS
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "regress",
    version,
    about = "Run regression tests for the chow allocator",
    override_usage = "regress [OPTIONS] -f <TEST> [-f <TEST2> ...] [-- <TOOL_ARGS>...]"
)]
pub struct RegressArgs {
    /// Use tests from file (repeatable)
    #[arg(short = 'f', long = "file", value_name = "TEST", required = true)]
    pub files: Vec<PathBuf>,

    /// Set the log file for the tests
    #[arg(short = 'l', long = "logfile", value_name = "LOG_FILE")]
    pub logfile: Option<PathBuf>,

    /// Set the output file for the tests
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_FILE")]
    pub output: Option<PathBuf>,

    /// Mail the output results to address (not supported)
    #[arg(short = 'm', long = "mail-to", value_name = "MAIL_ADDRESS")]
    pub mail_to: Option<String>,

    /// Tool invoked once per test
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_TOOL)]
    pub tool: String,

    /// List discovered tests without running them
    #[arg(long)]
    pub list: bool,

    /// Colorize the report when it goes to a terminal
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Arguments appended to every tool invocation
    #[arg(last = true, value_name = "TOOL_ARGS")]
    pub tool_args: Vec<String>,
}

impl From<RegressArgs> for RunConfig {
    fn from(args: RegressArgs) -> Self {
        RunConfig {
            files: args.files,
            output: args.output,
            logfile: args.logfile,
            mail_to: args.mail_to,
            tool: args.tool,
            tool_args: args.tool_args,
            list: args.list,
            color: args.color,
        }
    }
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

pub fn run() {
    let args = RegressArgs::parse();
    init_tracing(args.verbose);
    let config = RunConfig::from(args);
    process::exit(execute(&config));
}

/// Runs a configured session and returns the process exit status.
pub fn execute(config: &RunConfig) -> i32 {
    let mut report = match config.open_report() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return 1;
        }
    };

    match run_session(config, report.as_mut()) {
        Ok(code) => code,
        Err(e) => {
            let _ = writeln!(report, "{:?}", miette::Report::new(e));
            let _ = report.flush();
            1
        }
    }
}

fn run_session(config: &RunConfig, report: &mut dyn WriteColor) -> Result<i32, HarnessError> {
    if let Some(address) = &config.mail_to {
        warn!(address = %address, "mail delivery is not supported; report is not sent");
    }

    let tests = load_tests(&config.files, &OsDirSource)?;
    if config.list {
        Reporter::new(report).listing(&tests)?;
        return Ok(0);
    }

    let mut log = config.open_log()?;
    let mut executor = ProcessExecutor;
    let summary = run_and_report(tests, config, &mut executor, report, log.as_mut())?;
    Ok(exit_code(&summary))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("REGRESS_LOG").unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
