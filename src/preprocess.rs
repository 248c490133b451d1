//! Macro preprocessing of raw test-description files.
//!
//! Each line is classified into a [`LineKind`] and then interpreted:
//! skips and symbol definitions produce no output, literal test lines pass
//! through unchanged, and `$(expand <dir>)` lines are replaced by one line
//! per leaf directory under `<dir>`. The output keeps the
//! `path|args|expected|comment` layout consumed by the line parser.

use std::collections::HashMap;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::description::{Expectation, ExpectationParseError};
use crate::discovery::{leaf_directories, DirSource};
use crate::errors::{line_span, to_error_source, HarnessError, SourceArc, LINE_GRAMMAR_HELP};

lazy_static! {
    static ref SKIP_LINE: Regex = Regex::new(r"^\s*(#.*)?$").unwrap();
    static ref DEFINITION_LINE: Regex =
        Regex::new(r"^\s*!([A-Za-z_][A-Za-z0-9_]*)=(.*)$").unwrap();
    static ref TEST_LINE: Regex =
        Regex::new(r"^([^|]+)\|([^|]*)\|([A-Za-z]+)(?:\|([^|]*)(?:\|.*)?)?$").unwrap();
    static ref MACRO_TOKEN: Regex = Regex::new(r"\$\(([^)]*)\)").unwrap();
}

// ============================================================================
// LINE CLASSIFICATION
// ============================================================================

/// The four columns of a test line, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestLine<'a> {
    pub path: &'a str,
    pub args: &'a str,
    pub expected: Expectation,
    pub comment: &'a str,
    /// Everything after the path column, starting with the first `|`.
    pub tail: &'a str,
}

/// A `$(...)` token found in the path column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroToken<'a> {
    /// Path text before the token.
    pub prefix: &'a str,
    /// Text between `$(` and `)`.
    pub body: &'a str,
    /// Path text after the token.
    pub suffix: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Skip,
    Definition { name: &'a str, value: &'a str },
    MacroExpansion { line: TestLine<'a>, token: MacroToken<'a> },
    Literal(TestLine<'a>),
    /// Test-line shaped, but the expected column is an outcome that cannot
    /// be declared (`FAIL`, `XPASS`).
    UndeclarableExpectation { found: &'a str },
    Malformed,
}

/// Classifies one raw line. Trailing whitespace is ignored.
pub fn classify_line(raw: &str) -> LineKind<'_> {
    let line = raw.trim_end();
    if SKIP_LINE.is_match(line) {
        return LineKind::Skip;
    }
    if let Some(caps) = DEFINITION_LINE.captures(line) {
        let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
            return LineKind::Malformed;
        };
        return LineKind::Definition {
            name: name.as_str(),
            value: value.as_str(),
        };
    }
    let Some(test) = split_test_line(line) else {
        return LineKind::Malformed;
    };
    let test = match test {
        Ok(test) => test,
        Err(found) => return LineKind::UndeclarableExpectation { found },
    };
    match find_macro(test.path) {
        Some(token) => LineKind::MacroExpansion { line: test, token },
        None => LineKind::Literal(test),
    }
}

/// Splits a test line into columns. `Some(Err(token))` means the line has the
/// right shape but declares a non-declarable outcome.
pub(crate) fn split_test_line(line: &str) -> Option<Result<TestLine<'_>, &str>> {
    let caps = TEST_LINE.captures(line)?;
    let path = caps.get(1)?;
    let args = caps.get(2)?.as_str();
    let expected_text = caps.get(3)?.as_str();
    let comment = caps.get(4).map(|m| m.as_str()).unwrap_or("");

    let expected = match expected_text.parse::<Expectation>() {
        Ok(expected) => expected,
        Err(ExpectationParseError::NotDeclarable(_)) => return Some(Err(expected_text)),
        Err(ExpectationParseError::Unknown(_)) => return None,
    };
    Some(Ok(TestLine {
        path: path.as_str(),
        args,
        expected,
        comment,
        tail: &line[path.end()..],
    }))
}

fn find_macro(path: &str) -> Option<MacroToken<'_>> {
    let caps = MACRO_TOKEN.captures(path)?;
    let whole = caps.get(0)?;
    Some(MacroToken {
        prefix: &path[..whole.start()],
        body: caps.get(1)?.as_str(),
        suffix: &path[whole.end()..],
    })
}

// ============================================================================
// SYMBOL TABLE
// ============================================================================

/// Names bound by `!NAME=VALUE` lines. Later definitions overwrite earlier ones.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: HashMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, returning the value it replaced.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.symbols.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.symbols.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

// ============================================================================
// PREPROCESSOR
// ============================================================================

/// Result of one preprocessing pass over a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    /// Name of the input, used in diagnostics.
    pub name: String,
    /// Concrete `path|args|expected|comment` lines in emission order.
    pub lines: Vec<String>,
    /// Symbols defined while scanning the file.
    pub symbols: SymbolTable,
}

impl Preprocessed {
    /// The flattened stream as newline-terminated text.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

/// Expands macro shorthand in test-description files.
pub struct Preprocessor<'a> {
    dirs: &'a dyn DirSource,
}

impl<'a> Preprocessor<'a> {
    pub fn new(dirs: &'a dyn DirSource) -> Self {
        Self { dirs }
    }

    /// Reads and preprocesses a file from disk.
    pub fn process_file(&self, path: &Path) -> Result<Preprocessed, HarnessError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::io("read test file", path, e))?;
        self.process(&path.display().to_string(), &source)
    }

    /// Preprocesses `source`. The symbol table starts empty for every call.
    pub fn process(&self, name: &str, source: &str) -> Result<Preprocessed, HarnessError> {
        let src = to_error_source(name, source);
        let mut symbols = SymbolTable::new();
        let mut lines = Vec::new();

        for (number, offset, raw) in numbered_lines(source) {
            match classify_line(raw) {
                LineKind::Skip => {}
                LineKind::Definition { name: symbol, value } => {
                    trace!(symbol, value, "symbol defined");
                    symbols.define(symbol, value);
                }
                LineKind::Literal(_) => lines.push(raw.trim_end().to_string()),
                LineKind::MacroExpansion { line, token } => {
                    let site = MacroSite {
                        file: name,
                        src: &src,
                        offset,
                        raw,
                    };
                    self.expand(&site, &line, &token, &mut lines)?;
                }
                LineKind::UndeclarableExpectation { found } => {
                    return Err(HarnessError::InvalidExpectation {
                        file: name.to_string(),
                        line: number,
                        found: found.to_string(),
                        src: SourceArc::clone(&src),
                        span: line_span(offset, raw),
                    });
                }
                LineKind::Malformed => {
                    return Err(HarnessError::MalformedLine {
                        file: name.to_string(),
                        line: number,
                        src: SourceArc::clone(&src),
                        span: line_span(offset, raw),
                        help: Some(LINE_GRAMMAR_HELP.to_string()),
                    });
                }
            }
        }

        debug!(file = name, lines = lines.len(), symbols = symbols.len(), "preprocessed");
        Ok(Preprocessed {
            name: name.to_string(),
            lines,
            symbols,
        })
    }

    fn expand(
        &self,
        site: &MacroSite<'_>,
        line: &TestLine<'_>,
        token: &MacroToken<'_>,
        out: &mut Vec<String>,
    ) -> Result<(), HarnessError> {
        let mut words = token.body.split_whitespace();
        let dir = match (words.next(), words.next(), words.next()) {
            (Some("expand"), Some(dir), None) => dir,
            (Some("expand"), _, _) => {
                return Err(site.malformed_macro(token, "`expand` takes exactly one directory"))
            }
            (Some(command), _, _) => {
                return Err(HarnessError::UnknownMacroCommand {
                    file: site.file.to_string(),
                    command: command.to_string(),
                    src: SourceArc::clone(site.src),
                    span: site.token_span(token),
                })
            }
            (None, _, _) => return Err(site.malformed_macro(token, "empty macro")),
        };

        let root = format!("{}{}", token.prefix, dir);
        let leaves = leaf_directories(self.dirs, Path::new(&root))?;
        debug!(root = %root, leaves = leaves.len(), "expanded macro");
        for leaf in leaves {
            let path = format!("{}{}", leaf.display(), token.suffix);
            if path.contains('|') {
                return Err(site.malformed_macro(token, "expanded path contains `|`"));
            }
            out.push(format!("{}{}", path, line.tail));
        }
        Ok(())
    }
}

/// Where a macro line sits in its file, for diagnostics.
struct MacroSite<'a> {
    file: &'a str,
    src: &'a SourceArc,
    offset: usize,
    raw: &'a str,
}

impl MacroSite<'_> {
    fn token_span(&self, token: &MacroToken<'_>) -> miette::SourceSpan {
        // Path is the first column, so the token starts right after the prefix.
        let start = self.offset + token.prefix.len();
        miette::SourceSpan::new(start.into(), token.body.len() + 3)
    }

    fn malformed_macro(&self, token: &MacroToken<'_>, reason: &str) -> HarnessError {
        let span = if token.body.is_empty() {
            line_span(self.offset, self.raw)
        } else {
            self.token_span(token)
        };
        HarnessError::MalformedMacro {
            file: self.file.to_string(),
            body: token.body.to_string(),
            reason: reason.to_string(),
            src: SourceArc::clone(self.src),
            span,
        }
    }
}

/// Yields `(1-based line number, byte offset, line without terminator)`.
pub(crate) fn numbered_lines(source: &str) -> impl Iterator<Item = (usize, usize, &str)> {
    let mut offset = 0;
    source
        .split_inclusive('\n')
        .enumerate()
        .map(move |(index, chunk)| {
            let start = offset;
            offset += chunk.len();
            let line = chunk.trim_end_matches(&['\n', '\r'][..]);
            (index + 1, start, line)
        })
}
