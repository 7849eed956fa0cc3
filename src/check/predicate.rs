//! Predicate evaluation.
//!
//! Applies a compiled [`Predicate`] to one configuration node. Data that
//! does not satisfy the predicate yields [`Verdict::Fail`]; only broken
//! rules (references to containers, files that were never loaded) are
//! errors.

use std::cmp::Ordering;

use super::Documents;
use crate::config::{ConfigDocument, ConfigNode, ConfigValue, Lookup, NodePath};
use crate::error::{ConfigMateError, Result};
use crate::rulebook::{CompareOp, FieldRef, Literal, Operand, Predicate, Rule};
use crate::token::Token;

/// Why a value did not satisfy a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: String,
    pub found: String,
    /// Every node implicated, the checked node first.
    pub tokens: Vec<Token>,
}

/// Result of applying a predicate to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(Mismatch),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// What a predicate can see while it runs.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub rule: &'a Rule,
    /// The document the rule is checking; unqualified references resolve here.
    pub current: &'a ConfigDocument,
    /// Every loaded document by alias.
    pub documents: &'a Documents,
}

impl<'a> Scope<'a> {
    /// Resolve a field reference to a node or a missing sentinel.
    pub fn resolve(&self, field: &FieldRef) -> Result<Lookup<'a>> {
        let doc = match &field.file {
            None => self.current,
            Some(alias) => self
                .documents
                .get(alias)
                .ok_or_else(|| self.defect(format!("file alias '{}' is not loaded", alias)))?,
        };
        let path = NodePath::from_selector(&field.selector).ok_or_else(|| {
            self.defect(format!("field reference {} does not name a single field", field))
        })?;
        Ok(doc.get(&path))
    }

    fn defect(&self, message: String) -> ConfigMateError {
        ConfigMateError::Evaluation {
            rule: self.rule.id.clone(),
            message,
            token: self.rule.token.clone(),
        }
    }
}

/// Apply `predicate` to `node`.
pub fn evaluate(predicate: &Predicate, node: &ConfigNode, scope: &Scope<'_>) -> Result<Verdict> {
    let value = &node.value;
    let holds = match predicate {
        Predicate::Type(t) => t.matches(value),
        Predicate::Range { min, max } => value.as_f64().is_some_and(|n| {
            min.map_or(true, |min| n >= min) && max.map_or(true, |max| n <= max)
        }),
        Predicate::Length { min, max } => value
            .len()
            .is_some_and(|len| len >= *min && max.map_or(true, |max| len <= max)),
        Predicate::NonEmpty => !value.is_empty(),
        Predicate::Matches(pattern) => value.as_str().is_some_and(|s| pattern.is_match(s)),
        Predicate::OneOf(options) => options
            .iter()
            .any(|option| values_equal(value, &option.to_value())),
        Predicate::Compare {
            op,
            operand: Operand::Literal(literal),
        } => compare(*op, value, &literal.to_value()),
        Predicate::Compare {
            op,
            operand: Operand::Field(field),
        } => return compare_field(predicate, *op, field, node, scope),
        Predicate::Contains(literal) => contains(value, literal),
        Predicate::Unique => return unique(predicate, node),
        Predicate::Each(inner) => return each(predicate, inner, node, scope),
        Predicate::Not(inner) => !evaluate(inner, node, scope)?.is_pass(),
        Predicate::All(terms) => {
            for term in terms {
                if let Verdict::Fail(mismatch) = evaluate(term, node, scope)? {
                    return Ok(Verdict::Fail(mismatch));
                }
            }
            true
        }
        Predicate::Any(terms) => {
            let mut any = false;
            for term in terms {
                if evaluate(term, node, scope)?.is_pass() {
                    any = true;
                    break;
                }
            }
            any
        }
    };

    Ok(if holds {
        Verdict::Pass
    } else {
        Verdict::Fail(mismatch_at(node, predicate.describe()))
    })
}

fn mismatch_at(node: &ConfigNode, expected: String) -> Mismatch {
    Mismatch {
        expected,
        found: node.describe(),
        tokens: vec![node.token.clone()],
    }
}

fn compare_field(
    predicate: &Predicate,
    op: CompareOp,
    field: &FieldRef,
    node: &ConfigNode,
    scope: &Scope<'_>,
) -> Result<Verdict> {
    match scope.resolve(field)? {
        Lookup::Found(other) => {
            if other.value.is_container() {
                return Err(ConfigMateError::Evaluation {
                    rule: scope.rule.id.clone(),
                    message: format!(
                        "{} resolves to a {}, comparisons need a scalar",
                        field,
                        other.value.kind()
                    ),
                    token: scope.rule.token.clone(),
                });
            }
            if compare(op, &node.value, &other.value) {
                return Ok(Verdict::Pass);
            }
            Ok(Verdict::Fail(Mismatch {
                expected: format!("a value {} {} ({})", op.symbol(), field, other.describe()),
                found: node.describe(),
                tokens: vec![node.token.clone(), other.token.clone()],
            }))
        }
        Lookup::Missing { nearest } => Ok(Verdict::Fail(Mismatch {
            expected: predicate.describe(),
            found: format!("{}, but {} is missing", node.describe(), field),
            tokens: vec![node.token.clone(), nearest.token.clone()],
        })),
    }
}

fn unique(predicate: &Predicate, node: &ConfigNode) -> Result<Verdict> {
    let ConfigValue::Sequence(items) = &node.value else {
        return Ok(Verdict::Fail(mismatch_at(node, predicate.describe())));
    };

    let duplicates: Vec<&ConfigNode> = items
        .iter()
        .enumerate()
        .filter(|(i, item)| items[..*i].iter().any(|earlier| values_equal(&earlier.value, &item.value)))
        .map(|(_, item)| item)
        .collect();

    if duplicates.is_empty() {
        return Ok(Verdict::Pass);
    }

    let paths: Vec<String> = duplicates.iter().map(|d| d.path.to_string()).collect();
    Ok(Verdict::Fail(Mismatch {
        expected: predicate.describe(),
        found: format!("duplicate items at {}", paths.join(", ")),
        tokens: duplicates.iter().map(|d| d.token.clone()).collect(),
    }))
}

fn each(
    predicate: &Predicate,
    inner: &Predicate,
    node: &ConfigNode,
    scope: &Scope<'_>,
) -> Result<Verdict> {
    if !node.value.is_container() {
        return Ok(Verdict::Fail(mismatch_at(node, predicate.describe())));
    }

    let mut found = Vec::new();
    let mut tokens = Vec::new();
    for child in node.children() {
        if let Verdict::Fail(mismatch) = evaluate(inner, child, scope)? {
            found.push(format!("{} is {}", child.path, mismatch.found));
            tokens.extend(mismatch.tokens);
        }
    }

    if found.is_empty() {
        return Ok(Verdict::Pass);
    }
    Ok(Verdict::Fail(Mismatch {
        expected: predicate.describe(),
        found: found.join(", "),
        tokens,
    }))
}

fn contains(value: &ConfigValue, needle: &Literal) -> bool {
    match (value, needle) {
        (ConfigValue::Sequence(items), _) => {
            let needle = needle.to_value();
            items.iter().any(|item| values_equal(&item.value, &needle))
        }
        (ConfigValue::String(haystack), Literal::String(needle)) => haystack.contains(needle.as_str()),
        (ConfigValue::Mapping(entries), Literal::String(key)) => {
            entries.iter().any(|entry| &entry.key == key)
        }
        _ => false,
    }
}

fn compare(op: CompareOp, left: &ConfigValue, right: &ConfigValue) -> bool {
    match op {
        CompareOp::Eq => values_equal(left, right),
        CompareOp::Ne => !values_equal(left, right),
        CompareOp::Lt => ordering(left, right) == Some(Ordering::Less),
        CompareOp::Le => matches!(
            ordering(left, right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        CompareOp::Gt => ordering(left, right) == Some(Ordering::Greater),
        CompareOp::Ge => matches!(
            ordering(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

/// Numbers order numerically and strings lexically; nothing else orders.
fn ordering(left: &ConfigValue, right: &ConfigValue) -> Option<Ordering> {
    match (left, right) {
        (ConfigValue::String(a), ConfigValue::String(b)) => Some(a.cmp(b)),
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

/// Structural equality that ignores locations. Integers equal floats of the
/// same value; mappings compare regardless of key order.
pub fn values_equal(left: &ConfigValue, right: &ConfigValue) -> bool {
    match (left, right) {
        (ConfigValue::Null, ConfigValue::Null) => true,
        (ConfigValue::Bool(a), ConfigValue::Bool(b)) => a == b,
        (ConfigValue::String(a), ConfigValue::String(b)) => a == b,
        (ConfigValue::Integer(a), ConfigValue::Integer(b)) => a == b,
        (ConfigValue::Sequence(a), ConfigValue::Sequence(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(x, y)| values_equal(&x.value, &y.value))
        }
        (ConfigValue::Mapping(a), ConfigValue::Mapping(b)) => {
            a.len() == b.len()
                && a.iter().all(|entry| {
                    b.iter()
                        .find(|other| other.key == entry.key)
                        .is_some_and(|other| values_equal(&entry.value.value, &other.value.value))
                })
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_config, ConfigFormat, Selector};
    use crate::rulebook::parse_predicate;
    use std::collections::HashMap;
    use std::path::Path;

    const SERVER: &str = "port: 8080\nname: \"abc\"\ntags: [a, b, a]\nempty: []\nlimits:\n  min: 10\n  max: 100\nreplicas: 50\nservers:\n  - port: 80\n  - port: 0\n";

    fn doc() -> ConfigDocument {
        parse_config(SERVER, Path::new("server.yaml"), ConfigFormat::Yaml).unwrap()
    }

    fn rule() -> Rule {
        Rule {
            id: "T".into(),
            description: None,
            file: None,
            field: Selector::parse("port").unwrap(),
            value_type: None,
            check: None,
            optional: false,
            notes: None,
            token: Token::new("book.yml", 5, 9, 1),
            field_token: Token::new("book.yml", 6, 12, 4),
        }
    }

    fn run(check: &str, field: &str) -> Result<Verdict> {
        let doc = doc();
        let mut docs = HashMap::new();
        docs.insert("server".to_string(), doc.clone());
        let rule = rule();
        let scope = Scope {
            rule: &rule,
            current: &doc,
            documents: &docs,
        };
        let predicate = parse_predicate(check).unwrap();
        let selector = Selector::parse(field).unwrap();
        let node = doc.select(&selector).found[0];
        evaluate(&predicate, node, &scope)
    }

    fn passes(check: &str, field: &str) -> bool {
        run(check, field).unwrap().is_pass()
    }

    fn mismatch(check: &str, field: &str) -> Mismatch {
        match run(check, field).unwrap() {
            Verdict::Fail(m) => m,
            Verdict::Pass => panic!("expected {check} to fail on {field}"),
        }
    }

    #[test]
    fn type_and_range_checks() {
        assert!(passes("int && range(1, 65535)", "port"));
        assert!(!passes("range(1, 100)", "port"));
        assert!(!passes("int", "name"));
        assert!(passes("float", "port"));
    }

    #[test]
    fn range_failure_explains_and_locates() {
        let m = mismatch("range(1, 100)", "port");
        assert_eq!(m.expected, "a number in [1, 100]");
        assert_eq!(m.found, "integer 8080");
        assert_eq!(m.tokens, vec![Token::new("server.yaml", 1, 7, 4)]);
    }

    #[test]
    fn string_checks() {
        assert!(passes(r#"matches("^[a-c]+$")"#, "name"));
        assert!(passes("len(3)", "name"));
        assert!(!passes("len(4, 10)", "name"));
        assert!(passes(r#"oneof("abc", "def")"#, "name"));
        assert!(passes(r#"contains("b")"#, "name"));
    }

    #[test]
    fn collection_checks() {
        assert!(passes(r#"contains("b")"#, "tags"));
        assert!(passes("nonempty", "tags"));
        assert!(!passes("nonempty", "empty"));
        assert!(passes(r#"contains("max")"#, "limits"));
    }

    #[test]
    fn unique_reports_each_duplicate() {
        let m = mismatch("unique", "tags");
        assert_eq!(m.found, "duplicate items at tags[2]");
        assert_eq!(m.tokens, vec![Token::new("server.yaml", 3, 14, 1)]);
    }

    #[test]
    fn each_collects_failing_children() {
        let m = mismatch("each(map && min(1))", "servers");
        assert_eq!(m.expected, "every item to be map and a number >= 1");
        assert_eq!(m.tokens.len(), 2);

        let m = mismatch("each(string && oneof(\"a\"))", "tags");
        assert_eq!(m.found, "tags[1] is string \"b\"");
    }

    #[test]
    fn each_over_empty_list_passes() {
        assert!(passes("each(int)", "empty"));
    }

    #[test]
    fn boolean_combinators() {
        assert!(passes("string || int", "port"));
        assert!(!passes("!int", "port"));
        assert!(passes("!(string || list)", "port"));
    }

    #[test]
    fn field_comparison_implicates_both_nodes() {
        assert!(passes("ge(@limits.min) && le(@limits.max)", "replicas"));

        let m = mismatch("lt(@limits.min)", "replicas");
        assert_eq!(m.tokens.len(), 2);
        assert_eq!(m.tokens[1], Token::new("server.yaml", 6, 8, 2));
        assert!(m.expected.contains("@limits.min"));
    }

    #[test]
    fn cross_file_reference_resolves_by_alias() {
        assert!(passes("eq(@server:servers[0].port)", "servers[0].port"));
    }

    #[test]
    fn missing_reference_is_a_data_failure() {
        let m = mismatch("eq(@limits.avg)", "replicas");
        assert!(m.found.contains("@limits.avg is missing"));
        assert_eq!(m.tokens[1].row, 5);
    }

    #[test]
    fn container_reference_is_an_evaluation_error() {
        let err = run("eq(@limits)", "replicas").unwrap_err();
        assert!(err.is_defect());
        assert_eq!(err.token(), Some(&Token::new("book.yml", 5, 9, 1)));
    }

    #[test]
    fn unloaded_alias_is_an_evaluation_error() {
        let err = run("eq(@other:port)", "port").unwrap_err();
        assert!(matches!(err, ConfigMateError::Evaluation { .. }));
    }

    #[test]
    fn numbers_compare_across_int_and_float() {
        assert!(values_equal(
            &ConfigValue::Integer(2),
            &ConfigValue::Float(2.0)
        ));
        assert!(!values_equal(
            &ConfigValue::String("2".into()),
            &ConfigValue::Integer(2)
        ));
    }
}
