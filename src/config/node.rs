//! Located configuration trees.
//!
//! Every loader produces a [`ConfigDocument`]: a tree of [`ConfigNode`]s in
//! which each node knows its own path and the [`Token`] that defined it.
//! Trees are built once and only read afterwards.

use std::fmt;
use std::path::{Path, PathBuf};

use super::format::ConfigFormat;
use super::selector::{Selector, SelectorSegment};
use crate::token::Token;

/// One step in a [`NodePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Mapping key.
    Key(String),
    /// Sequence index.
    Index(usize),
}

/// Address of a node inside a document, from the root down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<PathSegment>);

impl NodePath {
    /// The empty path that addresses the document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from keys, mostly useful in tests.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(|k| PathSegment::Key(k.into())).collect())
    }

    /// The concrete path a wildcard-free selector names.
    pub fn from_selector(selector: &Selector) -> Option<Self> {
        selector
            .segments()
            .iter()
            .map(|segment| match segment {
                SelectorSegment::Key(key) => Some(PathSegment::Key(key.clone())),
                SelectorSegment::Index(index) => Some(PathSegment::Index(*index)),
                SelectorSegment::Wildcard => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Path of a mapping child.
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// Path of a sequence item.
    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// The segments making up this path.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Whether this path addresses the root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    if key.is_empty() || key.contains(&['.', '[', ']', '"', ' '][..]) {
                        write!(f, "\"{}\"", key.replace('"', "\\\""))?;
                    } else {
                        write!(f, "{}", key)?;
                    }
                }
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// The coarse kind of a value, used in explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Sequence,
    Mapping,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Sequence => "list",
            ValueKind::Mapping => "map",
        };
        write!(f, "{}", name)
    }
}

/// A mapping entry, keeping the location of its key.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: String,
    pub key_token: Token,
    pub value: ConfigNode,
}

/// The value held by a [`ConfigNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<ConfigNode>),
    /// Entries in source order.
    Mapping(Vec<MapEntry>),
}

impl ConfigValue {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Null => ValueKind::Null,
            ConfigValue::Bool(_) => ValueKind::Bool,
            ConfigValue::Integer(_) => ValueKind::Integer,
            ConfigValue::Float(_) => ValueKind::Float,
            ConfigValue::String(_) => ValueKind::String,
            ConfigValue::Sequence(_) => ValueKind::Sequence,
            ConfigValue::Mapping(_) => ValueKind::Mapping,
        }
    }

    /// Whether this value holds child nodes.
    pub fn is_container(&self) -> bool {
        matches!(self, ConfigValue::Sequence(_) | ConfigValue::Mapping(_))
    }

    /// Numeric view of integers and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Integer(n) => Some(*n as f64),
            ConfigValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// String view of string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Length of strings (in characters), sequences and mappings.
    pub fn len(&self) -> Option<usize> {
        match self {
            ConfigValue::String(s) => Some(s.chars().count()),
            ConfigValue::Sequence(items) => Some(items.len()),
            ConfigValue::Mapping(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Whether `len()` is zero. Scalars other than strings are never empty.
    pub fn is_empty(&self) -> bool {
        matches!(self.len(), Some(0)) || matches!(self, ConfigValue::Null)
    }

    /// Human-readable description used in "found ..." explanations.
    pub fn describe(&self) -> String {
        match self {
            ConfigValue::Null => "null".to_string(),
            ConfigValue::Bool(b) => format!("boolean {}", b),
            ConfigValue::Integer(n) => format!("integer {}", n),
            ConfigValue::Float(n) => format!("float {}", n),
            ConfigValue::String(s) => format!("string {:?}", s),
            ConfigValue::Sequence(items) => match items.len() {
                1 => "list of 1 item".to_string(),
                n => format!("list of {} items", n),
            },
            ConfigValue::Mapping(entries) => match entries.len() {
                1 => "map with 1 key".to_string(),
                n => format!("map with {} keys", n),
            },
        }
    }
}

/// A node in a parsed configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNode {
    pub path: NodePath,
    pub value: ConfigValue,
    pub token: Token,
}

impl ConfigNode {
    /// Create a node.
    pub fn new(path: NodePath, value: ConfigValue, token: Token) -> Self {
        Self { path, value, token }
    }

    /// An empty mapping at the root of `file`.
    pub fn empty_root(file: &Path) -> Self {
        Self::new(
            NodePath::root(),
            ConfigValue::Mapping(Vec::new()),
            Token::file_start(file),
        )
    }

    /// Mapping child by key.
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.entries()
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    /// Child addressed by one path segment.
    pub fn child(&self, segment: &PathSegment) -> Option<&ConfigNode> {
        match segment {
            PathSegment::Key(key) => self.get(key),
            PathSegment::Index(index) => self.items().get(*index),
        }
    }

    /// Mapping entries, empty for non-mappings.
    pub fn entries(&self) -> &[MapEntry] {
        match &self.value {
            ConfigValue::Mapping(entries) => entries,
            _ => &[],
        }
    }

    /// Sequence items, empty for non-sequences.
    pub fn items(&self) -> &[ConfigNode] {
        match &self.value {
            ConfigValue::Sequence(items) => items,
            _ => &[],
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&ConfigNode> {
        match &self.value {
            ConfigValue::Sequence(items) => items.iter().collect(),
            ConfigValue::Mapping(entries) => entries.iter().map(|e| &e.value).collect(),
            _ => Vec::new(),
        }
    }

    /// Visit this node and all descendants in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a ConfigNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Description of the held value.
    pub fn describe(&self) -> String {
        self.value.describe()
    }
}

/// Result of looking up one concrete path.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    Found(&'a ConfigNode),
    /// Nothing lives at the path; `nearest` is the deepest existing ancestor.
    Missing { nearest: &'a ConfigNode },
}

impl<'a> Lookup<'a> {
    /// The found node, if any.
    pub fn node(&self) -> Option<&'a ConfigNode> {
        match self {
            Lookup::Found(node) => Some(node),
            Lookup::Missing { .. } => None,
        }
    }

    /// Whether the lookup came back empty.
    pub fn is_missing(&self) -> bool {
        matches!(self, Lookup::Missing { .. })
    }
}

/// A selector branch that ran into a missing key or index.
#[derive(Debug, Clone)]
pub struct MissingBranch<'a> {
    /// Path of the first segment that could not be resolved.
    pub path: NodePath,
    /// Deepest node that does exist on the branch.
    pub nearest: &'a ConfigNode,
}

/// Result of resolving a [`Selector`], which may match many nodes.
#[derive(Debug, Clone, Default)]
pub struct Selection<'a> {
    pub found: Vec<&'a ConfigNode>,
    pub missing: Vec<MissingBranch<'a>>,
}

impl Selection<'_> {
    /// Nothing matched and at least one branch was missing.
    pub fn is_missing(&self) -> bool {
        self.found.is_empty() && !self.missing.is_empty()
    }
}

/// A loaded configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    pub file: PathBuf,
    pub format: ConfigFormat,
    pub root: ConfigNode,
}

impl ConfigDocument {
    /// Wrap a parsed tree.
    pub fn new(file: impl Into<PathBuf>, format: ConfigFormat, root: ConfigNode) -> Self {
        Self {
            file: file.into(),
            format,
            root,
        }
    }

    /// The file this document was loaded from.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Look up a concrete path.
    pub fn get(&self, path: &NodePath) -> Lookup<'_> {
        let mut current = &self.root;
        for segment in path.segments() {
            match current.child(segment) {
                Some(child) => current = child,
                None => return Lookup::Missing { nearest: current },
            }
        }
        Lookup::Found(current)
    }

    /// Resolve a selector, expanding wildcards.
    ///
    /// A wildcard over an empty collection or a scalar matches nothing and
    /// is not reported as missing.
    pub fn select(&self, selector: &Selector) -> Selection<'_> {
        let mut frontier = vec![&self.root];
        let mut missing = Vec::new();

        for segment in selector.segments() {
            let mut next = Vec::new();
            for node in frontier {
                match segment {
                    SelectorSegment::Key(key) => match node.get(key) {
                        Some(child) => next.push(child),
                        None => missing.push(MissingBranch {
                            path: node.path.child_key(key.as_str()),
                            nearest: node,
                        }),
                    },
                    SelectorSegment::Index(index) => match node.items().get(*index) {
                        Some(child) => next.push(child),
                        None => missing.push(MissingBranch {
                            path: node.path.child_index(*index),
                            nearest: node,
                        }),
                    },
                    SelectorSegment::Wildcard => next.extend(node.children()),
                }
            }
            frontier = next;
        }

        Selection {
            found: frontier,
            missing,
        }
    }

    /// One token per node, in document order.
    pub fn tokens(&self) -> Vec<(NodePath, Token)> {
        let mut tokens = Vec::new();
        self.root
            .walk(&mut |node| tokens.push((node.path.clone(), node.token.clone())));
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(path: NodePath, value: ConfigValue, row: usize) -> ConfigNode {
        ConfigNode::new(path, value, Token::new("app.yml", row, 7, 4))
    }

    fn entry(key: &str, value: ConfigNode) -> MapEntry {
        MapEntry {
            key: key.to_string(),
            key_token: Token::new("app.yml", value.token.row, 1, key.len()),
            value,
        }
    }

    fn sample() -> ConfigDocument {
        let root = NodePath::root();
        let servers = root.child_key("servers");
        let first = servers.child_index(0);
        let second = servers.child_index(1);
        let tree = ConfigNode::new(
            root.clone(),
            ConfigValue::Mapping(vec![
                entry(
                    "name",
                    leaf(root.child_key("name"), ConfigValue::String("api".into()), 1),
                ),
                entry(
                    "servers",
                    ConfigNode::new(
                        servers.clone(),
                        ConfigValue::Sequence(vec![
                            ConfigNode::new(
                                first.clone(),
                                ConfigValue::Mapping(vec![entry(
                                    "port",
                                    leaf(first.child_key("port"), ConfigValue::Integer(80), 4),
                                )]),
                                Token::new("app.yml", 4, 3, 1),
                            ),
                            ConfigNode::new(
                                second.clone(),
                                ConfigValue::Mapping(vec![]),
                                Token::new("app.yml", 5, 3, 1),
                            ),
                        ]),
                        Token::new("app.yml", 3, 1, 7),
                    ),
                ),
            ]),
            Token::file_start("app.yml"),
        );
        ConfigDocument::new("app.yml", ConfigFormat::Yaml, tree)
    }

    #[test]
    fn node_path_display() {
        let path = NodePath::from_keys(["servers"]).child_index(0).child_key("port");
        assert_eq!(path.to_string(), "servers[0].port");
        assert_eq!(NodePath::root().to_string(), "(root)");
        assert_eq!(NodePath::from_keys(["a.b"]).to_string(), "\"a.b\"");
    }

    #[test]
    fn get_finds_existing_node() {
        let doc = sample();
        let path = NodePath::from_keys(["servers"]).child_index(0).child_key("port");

        let node = doc.get(&path).node().unwrap();
        assert_eq!(node.value, ConfigValue::Integer(80));
    }

    #[test]
    fn get_reports_nearest_ancestor_when_missing() {
        let doc = sample();
        let path = NodePath::from_keys(["servers"]).child_index(1).child_key("port");

        match doc.get(&path) {
            Lookup::Missing { nearest } => {
                assert_eq!(nearest.path, NodePath::from_keys(["servers"]).child_index(1))
            }
            Lookup::Found(_) => panic!("expected missing"),
        }
    }

    #[test]
    fn select_expands_wildcards_and_records_missing_branches() {
        let doc = sample();
        let selector: Selector = "servers[*].port".parse().unwrap();

        let selection = doc.select(&selector);
        assert_eq!(selection.found.len(), 1);
        assert_eq!(selection.missing.len(), 1);
        assert!(!selection.is_missing());
        assert_eq!(selection.missing[0].path.to_string(), "servers[1].port");
    }

    #[test]
    fn select_missing_top_level_key() {
        let doc = sample();
        let selector: Selector = "listen.port".parse().unwrap();

        let selection = doc.select(&selector);
        assert!(selection.is_missing());
        assert!(selection.missing[0].nearest.path.is_root());
    }

    #[test]
    fn tokens_cover_every_node_in_order() {
        let doc = sample();
        let tokens = doc.tokens();

        assert_eq!(tokens.len(), 6);
        assert!(tokens[0].0.is_root());
        assert_eq!(tokens[1].0.to_string(), "name");
        assert_eq!(tokens[4].0.to_string(), "servers[0].port");
    }

    #[test]
    fn describe_values() {
        assert_eq!(ConfigValue::String("abc".into()).describe(), "string \"abc\"");
        assert_eq!(ConfigValue::Integer(8080).describe(), "integer 8080");
        assert_eq!(ConfigValue::Sequence(vec![]).describe(), "list of 0 items");
        assert_eq!(ConfigValue::Null.kind().to_string(), "null");
    }
}
