//! Human-readable output formatter.
//!
//! Formats reports for terminal display with optional color support.

use console::Style;
use std::io::Write;

use super::ReportFormatter;
use crate::check::outcome::{OutcomeKind, Report, RuleOutcome};

/// Formats reports for human consumption.
pub struct HumanFormatter {
    /// Whether to use colors (ANSI escape codes).
    pub use_color: bool,
    /// Print passing outcomes too.
    pub show_passed: bool,
}

impl HumanFormatter {
    /// Create a new human formatter.
    pub fn new(use_color: bool) -> Self {
        Self {
            use_color,
            show_passed: false,
        }
    }

    pub fn show_passed(mut self, show: bool) -> Self {
        self.show_passed = show;
        self
    }

    fn style(&self, kind: OutcomeKind) -> Style {
        let style = match kind {
            OutcomeKind::Passed => Style::new().green(),
            OutcomeKind::Failed | OutcomeKind::LoadError => Style::new().red().bold(),
            OutcomeKind::Error => Style::new().magenta().bold(),
            OutcomeKind::Cancelled => Style::new().yellow(),
        };
        style.force_styling(self.use_color)
    }

    fn write_outcome<W: Write>(&self, outcome: &RuleOutcome, writer: &mut W) -> std::io::Result<()> {
        // Header line: failed[R1]: comment
        writeln!(
            writer,
            "{}[{}]: {}",
            self.style(outcome.kind).apply_to(outcome.kind),
            outcome.rule_id,
            outcome.comment
        )?;
        for token in &outcome.tokens {
            writeln!(writer, "  --> {} (length {})", token, token.length)?;
        }
        writeln!(writer)
    }
}

impl ReportFormatter for HumanFormatter {
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()> {
        for outcome in report.outcomes() {
            if outcome.passed && !self.show_passed {
                continue;
            }
            self.write_outcome(outcome, writer)?;
        }

        // Summary
        let passed = report.count(OutcomeKind::Passed);
        let failed = report.len() - passed;
        let summary = if report.passed() {
            self.style(OutcomeKind::Passed)
                .apply_to(format!("All {} check(s) passed", passed))
        } else {
            self.style(OutcomeKind::Failed)
                .apply_to(format!("{} of {} check(s) failed", failed, report.len()))
        };
        writeln!(writer, "{}", summary)
    }
}
