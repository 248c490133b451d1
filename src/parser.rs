//! Line parser for preprocessed test-description streams.
//!
//! Every non-skippable line must be a concrete `path|args|expected|comment`
//! line; anything else aborts the parse.

use tracing::debug;

use crate::description::{IdSequence, TestDescription};
use crate::errors::{line_span, to_error_source, HarnessError, LINE_GRAMMAR_HELP};
use crate::preprocess::{classify_line, numbered_lines, split_test_line, LineKind, Preprocessed};

/// Parses the output of one preprocessing pass.
///
/// Every emitted line is a test line, so none of them are skipped here even
/// if an expanded path happens to start with `#`.
pub fn parse_preprocessed(
    input: &Preprocessed,
    ids: &mut IdSequence,
) -> Result<Vec<TestDescription>, HarnessError> {
    let text = input.text();
    let mut tests = Vec::with_capacity(input.lines.len());
    let mut offset = 0;
    for (index, line) in input.lines.iter().enumerate() {
        let site = LineSite {
            file: &input.name,
            text: &text,
            number: index + 1,
            offset,
        };
        tests.push(site.parse(line, ids)?);
        offset += line.len() + 1;
    }
    debug!(file = %input.name, tests = tests.len(), "parsed test descriptions");
    Ok(tests)
}

/// Parses `text`, assigning ids from `ids` in line order. Blank and comment
/// lines are skipped.
pub fn parse(
    name: &str,
    text: &str,
    ids: &mut IdSequence,
) -> Result<Vec<TestDescription>, HarnessError> {
    let mut tests = Vec::new();
    for (number, offset, raw) in numbered_lines(text) {
        if classify_line(raw) == LineKind::Skip {
            continue;
        }
        let site = LineSite {
            file: name,
            text,
            number,
            offset,
        };
        tests.push(site.parse(raw, ids)?);
    }
    debug!(file = name, tests = tests.len(), "parsed test descriptions");
    Ok(tests)
}

/// Position of one line, for diagnostics.
struct LineSite<'a> {
    file: &'a str,
    text: &'a str,
    number: usize,
    offset: usize,
}

impl LineSite<'_> {
    fn parse(&self, raw: &str, ids: &mut IdSequence) -> Result<TestDescription, HarnessError> {
        match split_test_line(raw.trim_end()) {
            Some(Ok(fields)) => Ok(TestDescription::new(
                ids.next_id(),
                fields.path,
                fields.args,
                fields.expected,
                fields.comment,
            )),
            Some(Err(found)) => Err(HarnessError::InvalidExpectation {
                file: self.file.to_string(),
                line: self.number,
                found: found.to_string(),
                src: to_error_source(self.file, self.text),
                span: line_span(self.offset, raw),
            }),
            None => Err(HarnessError::MalformedLine {
                file: self.file.to_string(),
                line: self.number,
                src: to_error_source(self.file, self.text),
                span: line_span(self.offset, raw),
                help: Some(LINE_GRAMMAR_HELP.to_string()),
            }),
        }
    }
}
