//! YAML reader.
//!
//! `marked-yaml` supplies the node positions; `serde_yaml` is run first
//! because its errors carry a line and column for malformed input.

use std::path::Path;

use marked_yaml::types::{MarkedScalarNode, Node as YamlNode, Span};

use super::node::{ConfigNode, ConfigValue, MapEntry, NodePath};
use super::scalar::{infer_plain, SourceText};
use crate::error::{ConfigMateError, Result};
use crate::token::Token;

/// Parse YAML text into a located tree.
///
/// An empty document yields an empty mapping.
pub fn parse_yaml(text: &str, file: &Path) -> Result<ConfigNode> {
    if text.trim().is_empty() {
        return Ok(ConfigNode::empty_root(file));
    }

    if let Err(e) = serde_yaml::from_str::<serde_yaml::Value>(text) {
        let token = e
            .location()
            .map(|loc| Token::new(file, loc.line(), loc.column(), 0))
            .unwrap_or_else(|| Token::file_start(file));
        return Err(ConfigMateError::Parse {
            message: e.to_string(),
            token,
        });
    }

    let node = marked_yaml::parse_yaml(0, text).map_err(|e| ConfigMateError::Parse {
        message: e.to_string(),
        token: Token::file_start(file),
    })?;

    let builder = TreeBuilder {
        file,
        source: SourceText::new(text),
    };
    Ok(builder.build(&node, NodePath::root(), Token::file_start(file)))
}

struct TreeBuilder<'a> {
    file: &'a Path,
    source: SourceText<'a>,
}

impl TreeBuilder<'_> {
    /// `token` is used for containers; scalars measure their own.
    fn build(&self, node: &YamlNode, path: NodePath, token: Token) -> ConfigNode {
        match node {
            YamlNode::Scalar(scalar) => self.scalar(scalar, path),
            YamlNode::Mapping(mapping) => {
                let entries = mapping
                    .iter()
                    .map(|(key, value)| {
                        let key_token = self.scalar_token(key);
                        let child =
                            self.build(value, path.child_key(key.as_str()), key_token.clone());
                        MapEntry {
                            key: key.as_str().to_string(),
                            key_token,
                            value: child,
                        }
                    })
                    .collect();
                ConfigNode::new(path, ConfigValue::Mapping(entries), token)
            }
            YamlNode::Sequence(sequence) => {
                let items = sequence
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let item_token = self.start_token(item.span());
                        self.build(item, path.child_index(i), item_token)
                    })
                    .collect();
                ConfigNode::new(path, ConfigValue::Sequence(items), token)
            }
        }
    }

    fn scalar(&self, scalar: &MarkedScalarNode, path: NodePath) -> ConfigNode {
        let (row, col) = position(scalar.span());
        let text = scalar.as_str();
        let extent = self.source.extent(row, col, text);
        let value = if extent.quoted {
            ConfigValue::String(text.to_string())
        } else {
            infer_plain(text)
        };
        ConfigNode::new(
            path,
            value,
            Token::new(self.file, row, extent.col, extent.length),
        )
    }

    fn scalar_token(&self, scalar: &MarkedScalarNode) -> Token {
        let (row, col) = position(scalar.span());
        let extent = self.source.extent(row, col, scalar.as_str());
        Token::new(self.file, row, extent.col, extent.length)
    }

    /// One character at the start of a container.
    fn start_token(&self, span: &Span) -> Token {
        let (row, col) = position(span);
        Token::new(self.file, row, col, 1)
    }
}

fn position(span: &Span) -> (usize, usize) {
    span.start()
        .map(|marker| (marker.line(), marker.column()))
        .unwrap_or((1, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::node::Lookup;
    use crate::config::{ConfigDocument, ConfigFormat};

    fn doc(text: &str) -> ConfigDocument {
        let root = parse_yaml(text, Path::new("server.yaml")).unwrap();
        ConfigDocument::new("server.yaml", ConfigFormat::Yaml, root)
    }

    fn lookup<'a>(doc: &'a ConfigDocument, keys: &[&str]) -> &'a ConfigNode {
        match doc.get(&NodePath::from_keys(keys.iter().copied())) {
            Lookup::Found(node) => node,
            Lookup::Missing { .. } => panic!("missing {:?}", keys),
        }
    }

    const SERVER: &str = "# server config\nname: api\nlisten:\n  host: localhost\n  port: 8080\ntags: [web, \"edge\"]\n";

    #[test]
    fn types_plain_scalars() {
        let doc = doc(SERVER);
        assert_eq!(
            lookup(&doc, &["listen", "port"]).value,
            ConfigValue::Integer(8080)
        );
        assert_eq!(
            lookup(&doc, &["name"]).value,
            ConfigValue::String("api".into())
        );
    }

    #[test]
    fn quoted_scalars_stay_strings() {
        let doc = doc("port: \"8080\"\n");
        assert_eq!(
            lookup(&doc, &["port"]).value,
            ConfigValue::String("8080".into())
        );
    }

    #[test]
    fn leaf_tokens_cover_value() {
        let doc = doc(SERVER);
        let port = lookup(&doc, &["listen", "port"]);
        assert_eq!(port.token, Token::new("server.yaml", 5, 9, 4));
    }

    #[test]
    fn quoted_leaf_token_includes_quotes() {
        let doc = doc("# c\n# c\n# c\nport:  \"abc\"\n");
        let port = lookup(&doc, &["port"]);
        assert_eq!(port.token, Token::new("server.yaml", 4, 8, 5));
    }

    #[test]
    fn container_token_is_its_key() {
        let doc = doc(SERVER);
        let listen = lookup(&doc, &["listen"]);
        assert_eq!(listen.token, Token::new("server.yaml", 3, 1, 6));
    }

    #[test]
    fn flow_sequence_items_are_located() {
        let doc = doc(SERVER);
        let tags = lookup(&doc, &["tags"]);
        assert_eq!(tags.items().len(), 2);
        assert_eq!(tags.items()[0].token.col, 8);
        assert_eq!(tags.items()[1].token.length, 6);
    }

    #[test]
    fn empty_document_is_empty_mapping() {
        let doc = doc("\n# only a comment\n");
        assert!(doc.root.entries().is_empty());
    }

    #[test]
    fn syntax_error_is_located() {
        let err = parse_yaml("a: 1\nb: [unclosed\n", Path::new("bad.yaml")).unwrap_err();
        match err {
            ConfigMateError::Parse { token, .. } => {
                assert_eq!(token.file, Path::new("bad.yaml"));
                assert!(token.row >= 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
