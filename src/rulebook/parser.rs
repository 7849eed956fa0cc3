//! Rulebook parsing.
//!
//! Rulebook text is read into the same located tree as configuration files
//! and then interpreted, so every rule keeps the tokens that defined it.
//! Parsing is pure: the same text always yields the same [`Rulebook`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::expr::{parse_predicate, ExprError, ValueType};
use super::{FileSpec, Rule, Rulebook};
use crate::cancel::CancellationToken;
use crate::config::json::parse_json;
use crate::config::scalar::SourceText;
use crate::config::yaml::parse_yaml;
use crate::config::{ConfigFormat, ConfigNode, ConfigValue, FileSource, MapEntry, Selector};
use crate::error::{ConfigMateError, Result};
use crate::token::Token;

const TOP_LEVEL_KEYS: &[&str] = &["name", "description", "files", "rules"];
const FILE_KEYS: &[&str] = &["path", "format"];
const RULE_KEYS: &[&str] = &[
    "id",
    "description",
    "file",
    "field",
    "type",
    "check",
    "optional",
    "notes",
];

/// Parse rulebook text. Relative file paths resolve against the directory
/// of `file`.
pub fn parse_rulebook(text: &str, file: &Path) -> Result<Rulebook> {
    let base_dir = file.parent().unwrap_or_else(|| Path::new(""));
    parse_rulebook_in(text, file, base_dir)
}

/// Parse rulebook text, resolving relative file paths against `base_dir`.
pub fn parse_rulebook_in(text: &str, file: &Path, base_dir: &Path) -> Result<Rulebook> {
    let root = read_tree(text, file)?;
    let interpreter = Interpreter {
        file,
        source: SourceText::new(text),
        base_dir,
    };
    let rulebook = interpreter.rulebook(&root)?;
    debug!(
        "Parsed rulebook '{}' with {} file(s) and {} rule(s)",
        rulebook.name,
        rulebook.files.len(),
        rulebook.rules.len()
    );
    Ok(rulebook)
}

/// Read and parse a rulebook through `source`.
pub fn load_rulebook(
    source: &dyn FileSource,
    path: &Path,
    cancel: &CancellationToken,
) -> Result<Rulebook> {
    let text = source.read(path, cancel)?;
    parse_rulebook(&text, path)
}

/// Malformed rulebook text is a syntax problem, not a config parse problem.
fn read_tree(text: &str, file: &Path) -> Result<ConfigNode> {
    // Text with no telling extension (inline rulebooks) is JSON when it parses as such.
    let is_json = match ConfigFormat::from_path(file) {
        Some(format) => format == ConfigFormat::Json,
        None => {
            text.trim_start().starts_with('{')
                && serde_json::from_str::<serde_json::Value>(text).is_ok()
        }
    };
    let tree = if is_json {
        parse_json(text, file)
    } else {
        parse_yaml(text, file)
    };
    tree.map_err(|e| match e {
        ConfigMateError::Parse { message, token } => ConfigMateError::Syntax { message, token },
        other => other,
    })
}

fn syntax(token: &Token, message: impl Into<String>) -> ConfigMateError {
    ConfigMateError::Syntax {
        message: message.into(),
        token: token.clone(),
    }
}

struct Interpreter<'a> {
    file: &'a Path,
    source: SourceText<'a>,
    base_dir: &'a Path,
}

impl Interpreter<'_> {
    fn rulebook(&self, root: &ConfigNode) -> Result<Rulebook> {
        let entries = mapping(root, "the rulebook")?;
        check_keys(entries, TOP_LEVEL_KEYS, "rulebook")?;

        let name = text(required(root, "name", "the rulebook")?, "name")?;
        let description = root
            .get("description")
            .map(|n| text(n, "description"))
            .transpose()?;

        let files = self.files(required(root, "files", "the rulebook")?)?;

        let rules_node = required(root, "rules", "the rulebook")?;
        let ConfigValue::Sequence(items) = &rules_node.value else {
            return Err(syntax(
                &rules_node.token,
                format!("'rules' must be a list, found {}", rules_node.value.kind()),
            ));
        };

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(items.len());
        for item in items {
            let rule = self.rule(item, &files)?;
            if !seen.insert(rule.id.clone()) {
                return Err(syntax(
                    &rule.token,
                    format!("duplicate rule id '{}'", rule.id),
                ));
            }
            rules.push(rule);
        }

        Ok(Rulebook {
            name,
            description,
            source: self.file.to_path_buf(),
            files,
            rules,
        })
    }

    fn files(&self, node: &ConfigNode) -> Result<Vec<FileSpec>> {
        let mut files = Vec::new();
        for entry in mapping(node, "'files'")? {
            files.push(self.file_spec(entry)?);
        }
        Ok(files)
    }

    fn file_spec(&self, entry: &MapEntry) -> Result<FileSpec> {
        let value = &entry.value;
        let (path_node, format_node) = match &value.value {
            ConfigValue::String(_) => (value, None),
            ConfigValue::Mapping(fields) => {
                check_keys(fields, FILE_KEYS, "file")?;
                let path = required(value, "path", &format!("file '{}'", entry.key))?;
                (path, value.get("format"))
            }
            other => {
                return Err(syntax(
                    &value.token,
                    format!(
                        "file '{}' must be a path or a map with 'path', found {}",
                        entry.key,
                        other.kind()
                    ),
                ))
            }
        };

        let raw = PathBuf::from(text(path_node, "path")?);
        let format = match format_node {
            Some(node) => text(node, "format")?
                .parse::<ConfigFormat>()
                .map_err(|e| syntax(&node.token, e))?,
            None => ConfigFormat::from_path(&raw).ok_or_else(|| {
                syntax(
                    &path_node.token,
                    format!(
                        "cannot tell the format of '{}' from its extension; add a 'format'",
                        raw.display()
                    ),
                )
            })?,
        };

        let path = if raw.is_absolute() {
            raw
        } else {
            self.base_dir.join(raw)
        };

        Ok(FileSpec {
            alias: entry.key.clone(),
            path,
            format,
            token: entry.key_token.clone(),
        })
    }

    fn rule(&self, node: &ConfigNode, files: &[FileSpec]) -> Result<Rule> {
        let entries = mapping(node, "a rule")?;
        check_keys(entries, RULE_KEYS, "rule")?;

        let id_node = required(node, "id", "a rule")?;
        let id = text(id_node, "id")?;
        let token = id_node.token.clone();

        let field_node = required(node, "field", &format!("rule '{}'", id))?;
        let field_text = text(field_node, "field")?;
        let field = Selector::parse(&field_text).map_err(|e| {
            syntax(
                &self.sub_token(field_node, e.offset, 1),
                format!("invalid field selector: {}", e.message),
            )
        })?;

        let file = match node.get("file") {
            Some(file_node) => {
                let alias = text(file_node, "file")?;
                if !files.iter().any(|f| f.alias == alias) {
                    return Err(syntax(
                        &file_node.token,
                        format!("rule '{}' uses undefined file alias '{}'", id, alias),
                    ));
                }
                Some(alias)
            }
            None if files.is_empty() => {
                return Err(syntax(
                    &token,
                    format!("rule '{}' has no 'file' and the rulebook declares no files", id),
                ))
            }
            None => None,
        };

        let value_type = match node.get("type") {
            Some(type_node) => {
                let name = text(type_node, "type")?;
                Some(ValueType::from_name(&name).ok_or_else(|| {
                    ConfigMateError::UnknownRule {
                        rule: id.clone(),
                        name,
                        token: type_node.token.clone(),
                    }
                })?)
            }
            None => None,
        };

        let check = match node.get("check") {
            Some(check_node) => {
                let source = text(check_node, "check")?;
                let predicate = parse_predicate(&source)
                    .map_err(|e| self.expr_error(e, &id, check_node))?;
                for field in predicate.field_refs() {
                    if let Some(alias) = &field.file {
                        if !files.iter().any(|f| &f.alias == alias) {
                            return Err(syntax(
                                &check_node.token,
                                format!(
                                    "rule '{}' references undefined file alias '{}'",
                                    id, alias
                                ),
                            ));
                        }
                    }
                }
                Some(predicate)
            }
            None => None,
        };

        let optional = match node.get("optional") {
            Some(opt) => match opt.value {
                ConfigValue::Bool(b) => b,
                ref other => {
                    return Err(syntax(
                        &opt.token,
                        format!("'optional' must be true or false, found {}", other.kind()),
                    ))
                }
            },
            None => false,
        };

        let description = node
            .get("description")
            .map(|n| text(n, "description"))
            .transpose()?;
        let notes = node.get("notes").map(|n| text(n, "notes")).transpose()?;

        Ok(Rule {
            id,
            description,
            file,
            field,
            value_type,
            check,
            optional,
            notes,
            token,
            field_token: field_node.token.clone(),
        })
    }

    fn expr_error(&self, error: ExprError, rule: &str, node: &ConfigNode) -> ConfigMateError {
        let (offset, length) = error.span();
        let token = self.sub_token(node, offset, length);
        match error {
            ExprError::UnknownFunction { name, .. } => ConfigMateError::UnknownRule {
                rule: rule.to_string(),
                name,
                token,
            },
            ExprError::Syntax { message, .. } => ConfigMateError::Syntax {
                message: format!("in check of rule '{}': {}", rule, message),
                token,
            },
        }
    }

    /// Token for characters `offset..offset + length` of a string scalar.
    ///
    /// Falls back to the whole scalar when its source text is not a verbatim
    /// copy of the value (escapes, folding, block scalars).
    fn sub_token(&self, node: &ConfigNode, offset: usize, length: usize) -> Token {
        let value = node.value.as_str().unwrap_or_default();
        let extent = self.source.extent(node.token.row, node.token.col, value);
        if extent.exact {
            Token::new(self.file, node.token.row, extent.value_col() + offset, length)
        } else {
            node.token.clone()
        }
    }
}

fn mapping<'n>(node: &'n ConfigNode, what: &str) -> Result<&'n [MapEntry]> {
    match &node.value {
        ConfigValue::Mapping(entries) => Ok(entries),
        other => Err(syntax(
            &node.token,
            format!("{} must be a map, found {}", what, other.kind()),
        )),
    }
}

fn required<'n>(node: &'n ConfigNode, key: &str, owner: &str) -> Result<&'n ConfigNode> {
    node.get(key)
        .ok_or_else(|| syntax(&node.token, format!("{} is missing required key '{}'", owner, key)))
}

fn check_keys(entries: &[MapEntry], allowed: &[&str], owner: &str) -> Result<()> {
    for entry in entries {
        if !allowed.contains(&entry.key.as_str()) {
            return Err(syntax(
                &entry.key_token,
                format!(
                    "unknown {} key '{}' (expected one of: {})",
                    owner,
                    entry.key,
                    allowed.join(", ")
                ),
            ));
        }
    }
    Ok(())
}

/// A scalar as text. Integers are accepted so `id: 1` works.
fn text(node: &ConfigNode, key: &str) -> Result<String> {
    match &node.value {
        ConfigValue::String(s) => Ok(s.clone()),
        ConfigValue::Integer(n) => Ok(n.to_string()),
        other => Err(syntax(
            &node.token,
            format!("'{}' must be a string, found {}", key, other.kind()),
        )),
    }
}
