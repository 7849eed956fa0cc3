//! JSON reader.
//!
//! `serde_json` validates the document and locates syntax errors. A small
//! character reader then walks the validated text again to record where
//! every value starts and how long it is.

use std::path::Path;

use super::node::{ConfigNode, ConfigValue, MapEntry, NodePath};
use crate::error::{ConfigMateError, Result};
use crate::token::Token;

/// Parse JSON text into a located tree.
///
/// A blank document yields an empty mapping, like the other formats.
pub fn parse_json(text: &str, file: &Path) -> Result<ConfigNode> {
    if text.trim().is_empty() {
        return Ok(ConfigNode::empty_root(file));
    }

    if let Err(e) = serde_json::from_str::<serde_json::Value>(text) {
        return Err(ConfigMateError::Parse {
            message: e.to_string(),
            token: Token::new(file, e.line(), e.column(), 0),
        });
    }

    let mut reader = Reader::new(text, file);
    reader.skip_whitespace();
    let root = reader.value(NodePath::root(), Some(Token::file_start(file)))?;
    reader.skip_whitespace();
    if reader.peek().is_some() {
        return Err(reader.error("trailing characters after document"));
    }
    Ok(root)
}

struct Reader<'a> {
    file: &'a Path,
    chars: Vec<char>,
    pos: usize,
    row: usize,
    col: usize,
}

impl<'a> Reader<'a> {
    fn new(text: &str, file: &'a Path) -> Self {
        Self {
            file,
            chars: text.chars().collect(),
            pos: 0,
            row: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.row += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
    }

    fn here(&self, length: usize) -> Token {
        Token::new(self.file, self.row, self.col, length)
    }

    fn error(&self, message: &str) -> ConfigMateError {
        ConfigMateError::Parse {
            message: message.to_string(),
            token: self.here(1),
        }
    }

    fn expect(&mut self, wanted: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            _ => Err(self.error(&format!("expected '{}'", wanted))),
        }
    }

    /// Read one value. Containers take `outer` as their token when given
    /// (the key they sit under, or the file start for the root).
    fn value(&mut self, path: NodePath, outer: Option<Token>) -> Result<ConfigNode> {
        match self.peek() {
            Some('{') => {
                let token = outer.unwrap_or_else(|| self.here(1));
                self.object(path, token)
            }
            Some('[') => {
                let token = outer.unwrap_or_else(|| self.here(1));
                self.array(path, token)
            }
            Some('"') => {
                let (text, token) = self.string()?;
                Ok(ConfigNode::new(path, ConfigValue::String(text), token))
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(path),
            Some(_) => self.literal(path),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn object(&mut self, path: NodePath, token: Token) -> Result<ConfigNode> {
        self.expect('{')?;
        let mut entries: Vec<MapEntry> = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(ConfigNode::new(path, ConfigValue::Mapping(entries), token));
        }

        loop {
            self.skip_whitespace();
            let (key, key_token) = self.string()?;
            if entries.iter().any(|e| e.key == key) {
                return Err(ConfigMateError::Parse {
                    message: format!("duplicate key '{}'", key),
                    token: key_token,
                });
            }
            self.skip_whitespace();
            self.expect(':')?;
            self.skip_whitespace();
            let value = self.value(path.child_key(key.as_str()), Some(key_token.clone()))?;
            entries.push(MapEntry {
                key,
                key_token,
                value,
            });
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some('}') => break,
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }

        Ok(ConfigNode::new(path, ConfigValue::Mapping(entries), token))
    }

    fn array(&mut self, path: NodePath, token: Token) -> Result<ConfigNode> {
        self.expect('[')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.bump();
            return Ok(ConfigNode::new(path, ConfigValue::Sequence(items), token));
        }

        loop {
            self.skip_whitespace();
            items.push(self.value(path.child_index(items.len()), None)?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(']') => break,
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }

        Ok(ConfigNode::new(path, ConfigValue::Sequence(items), token))
    }

    /// A quoted string and the token spanning it, quotes included.
    fn string(&mut self) -> Result<(String, Token)> {
        let (row, col, start) = (self.row, self.col, self.pos);
        self.expect('"')?;
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => text.push(self.escape()?),
                Some(c) => text.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
        let token = Token::new(self.file, row, col, self.pos - start);
        Ok((text, token))
    }

    fn escape(&mut self) -> Result<char> {
        let c = match self.bump() {
            Some('"') => '"',
            Some('\\') => '\\',
            Some('/') => '/',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => {
                let high = self.hex4()?;
                if (0xD800..0xDC00).contains(&high) {
                    self.expect('\\')?;
                    self.expect('u')?;
                    let low = self.hex4()?;
                    let combined = 0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00));
                    char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER)
                } else {
                    char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER)
                }
            }
            _ => return Err(self.error("invalid escape")),
        };
        Ok(c)
    }

    fn hex4(&mut self) -> Result<u32> {
        let mut value = 0;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid unicode escape"))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn number(&mut self, path: NodePath) -> Result<ConfigNode> {
        let (row, col, start) = (self.row, self.col, self.pos);
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.bump();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let token = Token::new(self.file, row, col, self.pos - start);

        let is_float = text.contains(&['.', 'e', 'E'][..]);
        let value = match text.parse::<i64>() {
            Ok(n) if !is_float => ConfigValue::Integer(n),
            _ => text
                .parse::<f64>()
                .map(ConfigValue::Float)
                .map_err(|_| ConfigMateError::Parse {
                    message: format!("invalid number '{}'", text),
                    token: token.clone(),
                })?,
        };
        Ok(ConfigNode::new(path, value, token))
    }

    fn literal(&mut self, path: NodePath) -> Result<ConfigNode> {
        let (row, col, start) = (self.row, self.col, self.pos);
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.bump();
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        let token = Token::new(self.file, row, col, self.pos - start);
        let value = match word.as_str() {
            "true" => ConfigValue::Bool(true),
            "false" => ConfigValue::Bool(false),
            "null" => ConfigValue::Null,
            _ => {
                return Err(ConfigMateError::Parse {
                    message: format!("unexpected '{}'", word),
                    token,
                })
            }
        };
        Ok(ConfigNode::new(path, value, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ConfigNode {
        parse_json(text, Path::new("package.json")).unwrap()
    }

    const PACKAGE: &str = r#"{
  "name": "web",
  "port": 8080,
  "ratio": 0.5,
  "debug": false,
  "owner": null,
  "hosts": ["a", "b"],
  "db": {"pool": 10}
}"#;

    #[test]
    fn reads_values_with_types() {
        let root = parse(PACKAGE);
        assert_eq!(root.get("name").unwrap().value, ConfigValue::String("web".into()));
        assert_eq!(root.get("port").unwrap().value, ConfigValue::Integer(8080));
        assert_eq!(root.get("ratio").unwrap().value, ConfigValue::Float(0.5));
        assert_eq!(root.get("debug").unwrap().value, ConfigValue::Bool(false));
        assert_eq!(root.get("owner").unwrap().value, ConfigValue::Null);
        assert_eq!(root.get("hosts").unwrap().items().len(), 2);
    }

    #[test]
    fn leaf_tokens_span_source_text() {
        let root = parse(PACKAGE);
        assert_eq!(root.get("name").unwrap().token, Token::new("package.json", 2, 11, 5));
        assert_eq!(root.get("port").unwrap().token, Token::new("package.json", 3, 11, 4));
        assert_eq!(
            root.get("debug").unwrap().token,
            Token::new("package.json", 5, 12, 5)
        );
    }

    #[test]
    fn containers_use_key_token_and_items_use_start() {
        let root = parse(PACKAGE);
        let db = root.get("db").unwrap();
        assert_eq!(db.token, Token::new("package.json", 8, 3, 4));
        assert_eq!(db.get("pool").unwrap().path.to_string(), "db.pool");

        let hosts = root.get("hosts").unwrap();
        assert_eq!(hosts.items()[1].token, Token::new("package.json", 7, 18, 3));
        assert_eq!(hosts.items()[1].path.to_string(), "hosts[1]");
    }

    #[test]
    fn decodes_escapes() {
        let root = parse(r#"{"s": "a\"b\né😀"}"#);
        let s = root.get("s").unwrap();
        assert_eq!(s.value, ConfigValue::String("a\"b\né😀".into()));
        assert_eq!(s.token.length, 10);
    }

    #[test]
    fn root_array_items_are_located() {
        let root = parse("[{\"a\": 1}, 2]");
        assert_eq!(root.items()[0].token, Token::new("package.json", 1, 2, 1));
        assert_eq!(root.items()[1].token, Token::new("package.json", 1, 12, 1));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = parse_json("{\"a\": 1,\n \"a\": 2}", Path::new("x.json")).unwrap_err();
        match err {
            ConfigMateError::Parse { message, token } => {
                assert!(message.contains("duplicate key"));
                assert_eq!((token.row, token.col), (2, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn syntax_errors_are_located() {
        let err = parse_json("{\n  \"a\": 1,\n  \"b\" 2\n}", Path::new("x.json")).unwrap_err();
        match err {
            ConfigMateError::Parse { token, .. } => assert_eq!(token.row, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_document_is_empty_mapping() {
        assert!(parse("  \n").entries().is_empty());
    }
}
