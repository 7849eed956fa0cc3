//! Rule evaluation.
//!
//! The [`Evaluator`] applies one rule to one loaded document and always
//! produces a [`RuleOutcome`]. Data that breaks the rule is a failed
//! outcome; a defective rule is an outcome of kind `error`.

use tracing::{debug, error};

use super::outcome::RuleOutcome;
use super::predicate::{evaluate, Mismatch, Scope, Verdict};
use super::Documents;
use crate::error::{ConfigMateError, Result};
use crate::rulebook::Rule;
use crate::token::Token;

/// Default cap on tokens per outcome.
pub const DEFAULT_MAX_TOKENS: usize = 1000;

/// Knobs that shape outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalSettings {
    /// Append the rule's own token to failing outcomes.
    pub trace_rule_tokens: bool,
    /// Maximum number of tokens in one outcome.
    pub max_tokens: usize,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            trace_rule_tokens: false,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// A failing node, or a missing branch, with its explanation.
struct Failure {
    path: String,
    mismatch: Mismatch,
}

/// Applies rules to loaded documents.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    settings: EvalSettings,
}

impl Evaluator {
    pub fn new(settings: EvalSettings) -> Self {
        Self { settings }
    }

    /// Apply `rule` to the document loaded under `alias`.
    pub fn evaluate(&self, rule: &Rule, alias: &str, documents: &Documents) -> RuleOutcome {
        match self.try_evaluate(rule, alias, documents) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("Rule '{}' is defective: {}", rule.id, err);
                RuleOutcome::error(&rule.id, &err)
            }
        }
    }

    fn try_evaluate(&self, rule: &Rule, alias: &str, documents: &Documents) -> Result<RuleOutcome> {
        let doc = documents
            .get(alias)
            .ok_or_else(|| ConfigMateError::Evaluation {
                rule: rule.id.clone(),
                message: format!("file '{}' was not loaded", alias),
                token: rule.token.clone(),
            })?;
        let scope = Scope {
            rule,
            current: doc,
            documents,
        };
        let file = doc.file().display().to_string();
        let selection = doc.select(&rule.field);

        let mut failures = Vec::new();
        for node in &selection.found {
            if let Some(value_type) = rule.value_type {
                if !value_type.matches(&node.value) {
                    failures.push(Failure {
                        path: node.path.to_string(),
                        mismatch: Mismatch {
                            expected: value_type.to_string(),
                            found: node.describe(),
                            tokens: vec![node.token.clone()],
                        },
                    });
                    continue;
                }
            }
            if let Some(check) = &rule.check {
                if let Verdict::Fail(mismatch) = evaluate(check, node, &scope)? {
                    failures.push(Failure {
                        path: node.path.to_string(),
                        mismatch,
                    });
                }
            }
        }

        if !rule.optional {
            for branch in &selection.missing {
                let path = if rule.field.has_wildcard() {
                    branch.path.to_string()
                } else {
                    rule.field.to_string()
                };
                failures.push(Failure {
                    path,
                    mismatch: Mismatch {
                        expected: rule.expectation(),
                        found: "nothing (the field is missing)".to_string(),
                        tokens: vec![branch.nearest.token.clone()],
                    },
                });
            }
        }

        if failures.is_empty() {
            let comment = match &rule.description {
                Some(description) => format!("{}: {}", rule.id, description),
                None if selection.found.is_empty() && !selection.missing.is_empty() => format!(
                    "{}: {} is absent from {}, which is allowed",
                    rule.id, rule.field, file
                ),
                None if selection.found.is_empty() => {
                    format!("{}: no values at {} in {}", rule.id, rule.field, file)
                }
                None => format!("{}: {} in {} is {}", rule.id, rule.field, file, rule.expectation()),
            };
            return Ok(RuleOutcome::passed(&rule.id, comment));
        }

        Ok(self.failed(rule, &file, failures))
    }

    fn failed(&self, rule: &Rule, file: &str, failures: Vec<Failure>) -> RuleOutcome {
        let parts: Vec<String> = failures
            .iter()
            .map(|f| {
                format!(
                    "{} in {}: expected {}, found {}",
                    f.path, file, f.mismatch.expected, f.mismatch.found
                )
            })
            .collect();
        let mut comment = format!("{}: {}", rule.id, parts.join("; "));
        if let Some(notes) = &rule.notes {
            comment.push_str(&format!(" (note: {})", notes));
        }

        let mut tokens: Vec<Token> = Vec::new();
        for token in failures.into_iter().flat_map(|f| f.mismatch.tokens) {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }

        let max = self.settings.max_tokens;
        let limit = if self.settings.trace_rule_tokens {
            max.saturating_sub(1)
        } else {
            max
        };
        if tokens.len() > limit {
            let omitted = tokens.len() - limit;
            tokens.truncate(limit);
            comment.push_str(&format!(" [{} more location(s) omitted]", omitted));
        }
        if self.settings.trace_rule_tokens && max > 0 {
            tokens.push(rule.token.clone());
        }

        debug!("Rule '{}' failed: {}", rule.id, comment);
        RuleOutcome::failed(&rule.id, comment, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::OutcomeKind;
    use crate::config::{parse_config, ConfigFormat, Selector};
    use crate::rulebook::{parse_predicate, ValueType};
    use std::collections::HashMap;
    use std::path::Path;

    fn documents(text: &str) -> Documents {
        let doc = parse_config(text, Path::new("server.yaml"), ConfigFormat::Yaml).unwrap();
        let mut docs = HashMap::new();
        docs.insert("server".to_string(), doc);
        docs
    }

    fn rule(id: &str, field: &str) -> Rule {
        Rule {
            id: id.into(),
            description: None,
            file: Some("server".into()),
            field: Selector::parse(field).unwrap(),
            value_type: None,
            check: None,
            optional: false,
            notes: None,
            token: Token::new("book.yml", 4, 11, id.len()),
            field_token: Token::new("book.yml", 5, 12, field.len()),
        }
    }

    fn port_rule() -> Rule {
        Rule {
            value_type: Some(ValueType::Integer),
            check: Some(parse_predicate("range(1, 65535)").unwrap()),
            ..rule("R1", "port")
        }
    }

    const QUOTED: &str = "# server\nname: api\nhost: localhost\nport:  \"abc\"\n";
    const NUMERIC: &str = "# server\nname: api\nhost: localhost\nport:  8080\n";

    #[test]
    fn wrong_type_fails_at_value_token() {
        let outcome = Evaluator::default().evaluate(&port_rule(), "server", &documents(QUOTED));

        assert!(!outcome.passed);
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert!(outcome.comment.contains("R1"));
        assert_eq!(
            outcome.comment,
            "R1: port in server.yaml: expected integer, found string \"abc\""
        );
        assert_eq!(outcome.tokens, vec![Token::new("server.yaml", 4, 8, 5)]);
    }

    #[test]
    fn valid_value_passes_without_tokens() {
        let outcome = Evaluator::default().evaluate(&port_rule(), "server", &documents(NUMERIC));

        assert!(outcome.passed);
        assert!(outcome.tokens.is_empty());
    }

    #[test]
    fn missing_required_field_uses_nearest_ancestor() {
        let outcome = Evaluator::default().evaluate(
            &rule("R2", "listen.port"),
            "server",
            &documents("listen:\n  host: x\n"),
        );

        assert!(!outcome.passed);
        assert!(outcome.comment.contains("listen.port"));
        assert!(outcome.comment.contains("missing"));
        assert_eq!(outcome.tokens, vec![Token::new("server.yaml", 1, 1, 6)]);
    }

    #[test]
    fn missing_optional_field_passes() {
        let optional = Rule {
            optional: true,
            ..rule("R3", "tls.cert")
        };
        let outcome = Evaluator::default().evaluate(&optional, "server", &documents(NUMERIC));

        assert!(outcome.passed);
        assert!(outcome.tokens.is_empty());
    }

    #[test]
    fn wildcard_failures_are_joined() {
        let each_port = Rule {
            value_type: Some(ValueType::Integer),
            ..rule("R4", "servers[*].port")
        };
        let outcome = Evaluator::default().evaluate(
            &each_port,
            "server",
            &documents("servers:\n  - port: a\n  - port: 2\n  - port: b\n"),
        );

        assert_eq!(outcome.tokens.len(), 2);
        assert!(outcome.comment.contains("servers[0].port"));
        assert!(outcome.comment.contains("; servers[2].port"));
    }

    #[test]
    fn wildcard_over_empty_list_passes() {
        let outcome = Evaluator::default().evaluate(
            &rule("R5", "servers[*].port"),
            "server",
            &documents("servers: []\n"),
        );
        assert!(outcome.passed);
    }

    #[test]
    fn notes_are_appended_to_failures() {
        let noted = Rule {
            notes: Some("ports are numbers".into()),
            ..port_rule()
        };
        let outcome = Evaluator::default().evaluate(&noted, "server", &documents(QUOTED));
        assert!(outcome.comment.ends_with("(note: ports are numbers)"));
    }

    #[test]
    fn trace_appends_rule_token() {
        let evaluator = Evaluator::new(EvalSettings {
            trace_rule_tokens: true,
            ..EvalSettings::default()
        });
        let outcome = evaluator.evaluate(&port_rule(), "server", &documents(QUOTED));

        assert_eq!(outcome.tokens.len(), 2);
        assert_eq!(outcome.tokens[1], Token::new("book.yml", 4, 11, 2));
    }

    #[test]
    fn token_cap_truncates_and_says_so() {
        let evaluator = Evaluator::new(EvalSettings {
            max_tokens: 1,
            ..EvalSettings::default()
        });
        let each_item = Rule {
            value_type: Some(ValueType::Integer),
            ..rule("R6", "items[*]")
        };
        let outcome = evaluator.evaluate(&each_item, "server", &documents("items: [a, b, c]\n"));

        assert_eq!(outcome.tokens.len(), 1);
        assert!(outcome.comment.contains("2 more location(s) omitted"));
    }

    #[test]
    fn unloaded_file_is_an_error_outcome() {
        let outcome = Evaluator::default().evaluate(&port_rule(), "other", &documents(NUMERIC));

        assert!(!outcome.passed);
        assert_eq!(outcome.kind, OutcomeKind::Error);
        assert_eq!(outcome.tokens, vec![Token::new("book.yml", 4, 11, 2)]);
    }

    #[test]
    fn description_is_used_for_passing_comment() {
        let described = Rule {
            description: Some("port is a valid TCP port".into()),
            ..port_rule()
        };
        let outcome = Evaluator::default().evaluate(&described, "server", &documents(NUMERIC));
        assert_eq!(outcome.comment, "R1: port is a valid TCP port");
    }
}
