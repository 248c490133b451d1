//! Harness error taxonomy.
//!
//! Every condition in here is fatal to the run. Individual test outcomes
//! (`FAIL`, `XFAIL`) are classifications, not errors, and never show up here.

use std::path::PathBuf;
use std::sync::Arc;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

pub type SourceArc = Arc<NamedSource<String>>;

/// Help text attached to malformed-line diagnostics.
pub const LINE_GRAMMAR_HELP: &str = "expected one of: a blank line, `# comment`, `!NAME=VALUE`, \
     or `path|args|PASS|comment` / `path|args|XFAIL|comment`";

#[derive(Error, Diagnostic, Debug)]
pub enum HarnessError {
    #[error("malformed line {line} in {file}")]
    #[diagnostic(code(regress::preprocess::malformed))]
    MalformedLine {
        file: String,
        line: usize,
        #[source_code]
        src: SourceArc,
        #[label("does not match any test-description form")]
        span: SourceSpan,
        #[help]
        help: Option<String>,
    },

    #[error("line {line} in {file} declares expectation `{found}`")]
    #[diagnostic(
        code(regress::parse::invalid_expectation),
        help("only PASS and XFAIL may be declared; FAIL and XPASS are observed outcomes")
    )]
    InvalidExpectation {
        file: String,
        line: usize,
        found: String,
        #[source_code]
        src: SourceArc,
        #[label("not a declarable expectation")]
        span: SourceSpan,
    },

    #[error("unknown macro command `{command}` in {file}")]
    #[diagnostic(
        code(regress::preprocess::unknown_macro),
        help("the only supported macro is `$(expand <dir>)`")
    )]
    UnknownMacroCommand {
        file: String,
        command: String,
        #[source_code]
        src: SourceArc,
        #[label("unknown command")]
        span: SourceSpan,
    },

    #[error("malformed macro `$({body})` in {file}: {reason}")]
    #[diagnostic(code(regress::preprocess::malformed_macro))]
    MalformedMacro {
        file: String,
        body: String,
        reason: String,
        #[source_code]
        src: SourceArc,
        #[label("invalid macro")]
        span: SourceSpan,
    },

    #[error("test {id} exited with unresolved status {}: {command}", describe_status(.status))]
    #[diagnostic(
        code(regress::run::unresolved_status),
        help("the tool must exit with 0 (success) or 99 (designated failure)")
    )]
    UnresolvedStatus {
        id: usize,
        status: Option<i32>,
        command: String,
    },

    #[error("test {id} was recorded more than once")]
    #[diagnostic(code(regress::stats::duplicate))]
    AlreadyRecorded { id: usize },

    #[error("failed to launch `{program}`")]
    #[diagnostic(
        code(regress::run::spawn),
        help("check that the tool is on PATH or pass --tool")
    )]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to {operation} {}", .path.display())]
    #[diagnostic(code(regress::io))]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report output")]
    #[diagnostic(code(regress::report::write))]
    Output(#[from] std::io::Error),

    #[error("invalid test script {}", .path.display())]
    #[diagnostic(code(regress::dsl::script))]
    Script {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl HarnessError {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "<terminated by signal>".to_string(),
    }
}

/// Wraps a file's text for use as diagnostic source code.
pub fn to_error_source(name: impl AsRef<str>, source: impl Into<String>) -> SourceArc {
    Arc::new(NamedSource::new(name.as_ref(), source.into()))
}

/// Byte span of a line within its file.
pub fn line_span(offset: usize, line: &str) -> SourceSpan {
    SourceSpan::new(offset.into(), line.len().max(1))
}
