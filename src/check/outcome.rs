//! Rule outcomes and reports.
//!
//! This module provides [`RuleOutcome`], the result of applying one rule to
//! one file, and [`Report`], the ordered list of outcomes for a whole check.

use std::fmt;

use crate::error::ConfigMateError;
use crate::token::Token;

/// Rule id used for outcomes that do not belong to a rule.
pub const LOAD_OUTCOME_ID: &str = "configmate:load";
/// Rule id of the outcome standing in for unfinished work.
pub const CANCELLED_OUTCOME_ID: &str = "configmate:cancelled";

/// Why an outcome has the `passed` value it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// The rule held.
    Passed,
    /// The data broke the rule.
    Failed,
    /// The rulebook or a config file could not be loaded.
    LoadError,
    /// The rule itself is defective.
    Error,
    /// The check stopped before this work finished.
    Cancelled,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutcomeKind::Passed => "passed",
            OutcomeKind::Failed => "failed",
            OutcomeKind::LoadError => "load-error",
            OutcomeKind::Error => "error",
            OutcomeKind::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// The result of applying one rule to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub passed: bool,
    pub comment: String,
    /// Locations implicated in the outcome, in evaluation order.
    pub tokens: Vec<Token>,
    pub kind: OutcomeKind,
}

impl RuleOutcome {
    /// A passing outcome. Passing outcomes carry no tokens.
    pub fn passed(rule_id: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            passed: true,
            comment: comment.into(),
            tokens: Vec::new(),
            kind: OutcomeKind::Passed,
        }
    }

    /// A rule violation.
    pub fn failed(
        rule_id: impl Into<String>,
        comment: impl Into<String>,
        tokens: Vec<Token>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            passed: false,
            comment: comment.into(),
            tokens,
            kind: OutcomeKind::Failed,
        }
    }

    /// The single outcome reported when loading fails.
    pub fn load_error(error: &ConfigMateError) -> Self {
        Self {
            rule_id: LOAD_OUTCOME_ID.to_string(),
            passed: false,
            comment: error.to_string(),
            tokens: error.token().cloned().into_iter().collect(),
            kind: OutcomeKind::LoadError,
        }
    }

    /// A defective rule, reported in place of its verdict.
    pub fn error(rule_id: impl Into<String>, error: &ConfigMateError) -> Self {
        Self {
            rule_id: rule_id.into(),
            passed: false,
            comment: error.to_string(),
            tokens: error.token().cloned().into_iter().collect(),
            kind: OutcomeKind::Error,
        }
    }

    /// Stand-in for everything that did not finish.
    pub fn cancelled(comment: impl Into<String>) -> Self {
        Self {
            rule_id: CANCELLED_OUTCOME_ID.to_string(),
            passed: false,
            comment: comment.into(),
            tokens: Vec::new(),
            kind: OutcomeKind::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == OutcomeKind::Cancelled
    }
}

/// Ordered outcomes of one check.
///
/// Order follows rule declaration order in the rulebook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    outcomes: Vec<RuleOutcome>,
}

impl Report {
    pub fn new(outcomes: Vec<RuleOutcome>) -> Self {
        Self { outcomes }
    }

    /// Whether every outcome passed. An empty report passes.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn outcomes(&self) -> &[RuleOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of outcomes of the given kind.
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.kind == kind).count()
    }

    /// Whether the check was cut short.
    pub fn was_cancelled(&self) -> bool {
        self.outcomes.iter().any(RuleOutcome::is_cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_report_passes() {
        let report = Report::default();
        assert!(report.passed());
        assert!(report.is_empty());
    }

    #[test]
    fn report_passes_only_when_all_pass() {
        let report = Report::new(vec![
            RuleOutcome::passed("R1", "ok"),
            RuleOutcome::failed("R2", "bad", vec![Token::new("a.yml", 1, 1, 1)]),
        ]);
        assert!(!report.passed());
        assert_eq!(report.count(OutcomeKind::Failed), 1);
    }

    #[test]
    fn load_error_outcome_keeps_token_and_names_file() {
        let err = ConfigMateError::FileNotFound {
            path: PathBuf::from("missing.yml"),
            token: Token::file_start("missing.yml"),
        };
        let outcome = RuleOutcome::load_error(&err);

        assert!(!outcome.passed);
        assert_eq!(outcome.kind, OutcomeKind::LoadError);
        assert!(outcome.comment.contains("missing.yml"));
        assert_eq!(outcome.tokens, vec![Token::new("missing.yml", 1, 1, 0)]);
    }

    #[test]
    fn cancelled_outcome_is_flagged() {
        let report = Report::new(vec![RuleOutcome::cancelled("timed out")]);
        assert!(report.was_cancelled());
        assert!(!report.passed());
    }

    #[test]
    fn kind_display() {
        assert_eq!(OutcomeKind::LoadError.to_string(), "load-error");
        assert_eq!(OutcomeKind::Error.to_string(), "error");
    }
}
