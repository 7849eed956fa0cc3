//! JSON output formatter.
//!
//! Writes the report as the same array the request API answers with, so
//! tooling can consume either interchangeably.

use std::io::Write;

use super::ReportFormatter;
use crate::api::RuleResponse;
use crate::check::outcome::Report;

/// Formats reports as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl ReportFormatter for JsonFormatter {
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()> {
        let responses = RuleResponse::from_report(report);
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &responses)?;
        } else {
            serde_json::to_writer(&mut *writer, &responses)?;
        }
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::outcome::RuleOutcome;
    use crate::token::Token;
    use serde_json::{json, Value};

    #[test]
    fn writes_response_array() {
        let report = Report::new(vec![
            RuleOutcome::passed("R1", "R1: ok"),
            RuleOutcome::failed("R2", "R2: bad", vec![Token::new("a.yml", 4, 8, 5)]),
        ]);

        let mut output = Vec::new();
        JsonFormatter::new(false).format(&report, &mut output).unwrap();
        let value: Value = serde_json::from_slice(&output).unwrap();

        assert_eq!(
            value,
            json!([
                {"passed": true, "result_comment": "R1: ok", "token_list": []},
                {
                    "passed": false,
                    "result_comment": "R2: bad",
                    "token_list": [{"file": "a.yml", "row": 4, "col": 8, "length": 5}]
                }
            ])
        );
    }

    #[test]
    fn empty_report_is_empty_array() {
        let mut output = Vec::new();
        JsonFormatter::new(true)
            .format(&Report::default(), &mut output)
            .unwrap();
        assert_eq!(String::from_utf8(output).unwrap().trim(), "[]");
    }
}
