//! Key-value file parsing.
//!
//! Covers `.env`, INI and properties style files.
//!
//! # Supported Formats
//!
//! - Simple: `KEY=value` or `key: value`
//! - Exported: `export KEY=value`
//! - Quoted: `KEY="value with spaces"` or `KEY='single quoted'`
//! - Empty: `KEY=`
//! - Comments: lines starting with `#` or `;`, and ` # trailing` on unquoted values
//! - Sections: `[database]` nests the following keys under `database`
//! - Dotted keys: `db.host = localhost` nests like a section would
//!
//! Unquoted values are typed like plain YAML scalars, so `PORT=8080` is an
//! integer and `DEBUG=true` a boolean. An empty unquoted value is the empty
//! string. Repeating a key is an error.

use std::path::Path;

use super::node::{ConfigNode, ConfigValue, MapEntry, NodePath};
use super::scalar::{closing_quote, infer_plain};
use crate::error::{ConfigMateError, Result};
use crate::token::Token;

/// Parse key-value text into a located tree of nested mappings.
pub fn parse_key_value(text: &str, file: &Path) -> Result<ConfigNode> {
    let mut parser = KeyValueParser {
        file,
        root: Table::default(),
        section: Vec::new(),
    };

    for (i, line) in text.lines().enumerate() {
        parser.parse_line(i + 1, line)?;
    }

    Ok(parser
        .root
        .into_node(NodePath::root(), Token::file_start(file)))
}

type KeySegment = (String, Token);

#[derive(Default)]
struct Table {
    entries: Vec<Entry>,
}

struct Entry {
    key: String,
    key_token: Token,
    slot: Slot,
}

enum Slot {
    Value(ConfigValue, Token),
    Table(Table),
}

impl Table {
    fn into_node(self, path: NodePath, token: Token) -> ConfigNode {
        let entries = self
            .entries
            .into_iter()
            .map(|entry| {
                let child_path = path.child_key(entry.key.as_str());
                let value = match entry.slot {
                    Slot::Value(value, token) => ConfigNode::new(child_path, value, token),
                    Slot::Table(table) => table.into_node(child_path, entry.key_token.clone()),
                };
                MapEntry {
                    key: entry.key,
                    key_token: entry.key_token,
                    value,
                }
            })
            .collect();
        ConfigNode::new(path, ConfigValue::Mapping(entries), token)
    }
}

struct KeyValueParser<'a> {
    file: &'a Path,
    root: Table,
    section: Vec<KeySegment>,
}

impl KeyValueParser<'_> {
    fn parse_line(&mut self, row: usize, line: &str) -> Result<()> {
        let chars: Vec<char> = line.chars().collect();
        let mut start = skip_whitespace(&chars, 0);

        match chars.get(start) {
            None | Some('#') | Some(';') => return Ok(()),
            Some('[') => return self.parse_section(row, &chars, start),
            _ => {}
        }

        if chars[start..].starts_with(&['e', 'x', 'p', 'o', 'r', 't', ' ']) {
            start = skip_whitespace(&chars, start + 7);
        }

        let Some(separator) = (start..chars.len()).find(|&i| matches!(chars[i], '=' | ':')) else {
            return Err(self.error(row, start, "expected 'key = value'"));
        };

        let segments = self.split_key(row, &chars, start, separator)?;
        let (value, token) = self.parse_value(row, &chars, separator + 1)?;

        let mut full = self.section.clone();
        full.extend(segments);
        let Some(((key, key_token), parents)) = full.split_last() else {
            return Err(self.error(row, start, "empty key"));
        };

        let table = descend(&mut self.root, parents)?;
        if table.entries.iter().any(|e| &e.key == key) {
            return Err(ConfigMateError::Parse {
                message: format!("duplicate key '{}'", key),
                token: key_token.clone(),
            });
        }
        table.entries.push(Entry {
            key: key.clone(),
            key_token: key_token.clone(),
            slot: Slot::Value(value, token),
        });
        Ok(())
    }

    fn parse_section(&mut self, row: usize, chars: &[char], open: usize) -> Result<()> {
        let Some(close) = (open..chars.len()).find(|&i| chars[i] == ']') else {
            return Err(self.error(row, open, "unclosed section header"));
        };
        let segments = self.split_key(row, chars, open + 1, close)?;
        descend(&mut self.root, &segments)?;
        self.section = segments;
        Ok(())
    }

    /// Split `chars[from..to]` on dots into trimmed, located key segments.
    fn split_key(
        &self,
        row: usize,
        chars: &[char],
        from: usize,
        to: usize,
    ) -> Result<Vec<KeySegment>> {
        let mut segments = Vec::new();
        let mut seg_start = from;
        for i in from..=to {
            if i < to && chars[i] != '.' {
                continue;
            }
            let first = skip_whitespace(chars, seg_start).min(i);
            let mut last = i;
            while last > first && chars[last - 1].is_whitespace() {
                last -= 1;
            }
            if first == last {
                return Err(self.error(row, first, "empty key"));
            }
            let key: String = chars[first..last].iter().collect();
            segments.push((key, Token::new(self.file, row, first + 1, last - first)));
            seg_start = i + 1;
        }
        Ok(segments)
    }

    fn parse_value(&self, row: usize, chars: &[char], from: usize) -> Result<(ConfigValue, Token)> {
        let start = skip_whitespace(chars, from);

        match chars.get(start) {
            None => Ok((
                ConfigValue::String(String::new()),
                Token::new(self.file, row, start + 1, 0),
            )),
            Some(&quote @ ('"' | '\'')) => {
                let Some(end) = closing_quote(chars, start, quote) else {
                    return Err(self.error(row, start, "unterminated quoted value"));
                };
                let inner = &chars[start + 1..end];
                let text = if quote == '"' {
                    unescape(inner)
                } else {
                    inner.iter().collect()
                };
                Ok((
                    ConfigValue::String(text),
                    Token::new(self.file, row, start + 1, end - start + 1),
                ))
            }
            Some(_) => {
                let mut end = (start + 1..chars.len())
                    .find(|&i| matches!(chars[i], '#' | ';') && chars[i - 1].is_whitespace())
                    .unwrap_or(chars.len());
                while end > start && chars[end - 1].is_whitespace() {
                    end -= 1;
                }
                let text: String = chars[start..end].iter().collect();
                Ok((
                    infer_plain(&text),
                    Token::new(self.file, row, start + 1, end - start),
                ))
            }
        }
    }

    fn error(&self, row: usize, index: usize, message: &str) -> ConfigMateError {
        ConfigMateError::Parse {
            message: message.to_string(),
            token: Token::new(self.file, row, index + 1, 1),
        }
    }
}

/// Walk (and create) nested tables along `segments`.
fn descend<'t>(mut table: &'t mut Table, segments: &[KeySegment]) -> Result<&'t mut Table> {
    for (key, token) in segments {
        let index = match table.entries.iter().position(|e| &e.key == key) {
            Some(index) => index,
            None => {
                table.entries.push(Entry {
                    key: key.clone(),
                    key_token: token.clone(),
                    slot: Slot::Table(Table::default()),
                });
                table.entries.len() - 1
            }
        };
        table = match &mut table.entries[index].slot {
            Slot::Table(child) => child,
            Slot::Value(..) => {
                return Err(ConfigMateError::Parse {
                    message: format!("key '{}' already holds a value", key),
                    token: token.clone(),
                })
            }
        };
    }
    Ok(table)
}

fn skip_whitespace(chars: &[char], mut i: usize) -> usize {
    while chars.get(i).is_some_and(|c| c.is_whitespace()) {
        i += 1;
    }
    i
}

fn unescape(chars: &[char]) -> String {
    let mut out = String::new();
    let mut iter = chars.iter();
    while let Some(&c) = iter.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match iter.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(&other @ ('"' | '\\' | '$')) => out.push(other),
            Some(&other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
