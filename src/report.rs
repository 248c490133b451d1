//! Summary rendering for the primary report sink.

use std::io;
use std::time::Duration;

use chrono::{DateTime, Local};
use termcolor::{Color, ColorSpec, WriteColor};

use crate::description::{Outcome, TestDescription};
use crate::runner::format_elapsed;
use crate::stats::Stats;

const RULE: &str = "*********************************************************";

/// Writes the end-of-run summary.
pub struct Reporter<'a> {
    out: &'a mut dyn WriteColor,
}

impl<'a> Reporter<'a> {
    pub fn new(out: &'a mut dyn WriteColor) -> Self {
        Self { out }
    }

    pub fn summary(
        &mut self,
        stats: &Stats,
        started: DateTime<Local>,
        elapsed: Duration,
    ) -> io::Result<()> {
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "                      SUMMARY                            ")?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "Completed {} tests", stats.count())?;
        for outcome in Outcome::ALL {
            let n = stats.get(outcome);
            if n > 0 {
                self.outcome_label(outcome)?;
                writeln!(self.out, ": {n}")?;
            }
        }
        writeln!(self.out)?;
        writeln!(self.out, "Start time: {}", started.format("%Y-%m-%d %H:%M:%S %z"))?;
        writeln!(self.out, "tests completed in {}", format_elapsed(elapsed))?;

        self.section("---- FAILURES ----", stats.failures())?;
        self.section("---- SUCCESSES ----", stats.successes())?;
        self.out.flush()
    }

    /// Prints tests one per line in `id|path|args|EXPECTED|comment` form.
    pub fn listing(&mut self, tests: &[TestDescription]) -> io::Result<()> {
        for test in tests {
            writeln!(self.out, "{test}")?;
        }
        self.out.flush()
    }

    fn section(&mut self, title: &str, tests: &[TestDescription]) -> io::Result<()> {
        if tests.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "{title}")?;
        for test in tests {
            writeln!(self.out, "{}", test.result_line())?;
        }
        Ok(())
    }

    fn outcome_label(&mut self, outcome: Outcome) -> io::Result<()> {
        let color = match outcome {
            Outcome::Pass | Outcome::XFail => Color::Green,
            Outcome::Fail => Color::Red,
            Outcome::XPass => Color::Yellow,
        };
        self.out
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(self.out, "{outcome}")?;
        self.out.reset()
    }
}
