//! Path selectors.
//!
//! A selector addresses one or more nodes in a configuration tree:
//!
//! ```text
//! listen.port            nested keys
//! servers[0].host        sequence index
//! servers[*].port        every item (also `servers.*.port`)
//! "log.level"            quoted key containing dots
//! ```

use std::fmt;
use std::str::FromStr;

/// One selector step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorSegment {
    Key(String),
    Index(usize),
    /// Every child of a mapping or sequence.
    Wildcard,
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    segments: Vec<SelectorSegment>,
}

/// Selector parse failure, located by character offset into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at offset {})", self.message, self.offset)
    }
}

impl std::error::Error for SelectorError {}

impl Selector {
    /// Parse selector text.
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        let chars: Vec<char> = text.chars().collect();
        let fail = |offset: usize, message: &str| SelectorError {
            offset,
            message: message.to_string(),
        };

        if chars.is_empty() {
            return Err(fail(0, "empty selector"));
        }

        let mut segments = Vec::new();
        let mut i = 0;
        loop {
            match chars.get(i) {
                Some('[') => {}
                Some('"') => {
                    let start = i;
                    i += 1;
                    let mut key = String::new();
                    loop {
                        match chars.get(i) {
                            Some('\\') if chars.get(i + 1) == Some(&'"') => {
                                key.push('"');
                                i += 2;
                            }
                            Some('"') => {
                                i += 1;
                                break;
                            }
                            Some(c) => {
                                key.push(*c);
                                i += 1;
                            }
                            None => return Err(fail(start, "unterminated quoted key")),
                        }
                    }
                    segments.push(SelectorSegment::Key(key));
                }
                Some('*') if matches!(chars.get(i + 1), None | Some('.') | Some('[')) => {
                    segments.push(SelectorSegment::Wildcard);
                    i += 1;
                }
                Some(_) => {
                    let start = i;
                    while let Some(c) = chars.get(i) {
                        if matches!(c, '.' | '[') {
                            break;
                        }
                        if matches!(c, ']' | '"') || c.is_whitespace() {
                            return Err(fail(i, &format!("unexpected '{}' in key", c)));
                        }
                        i += 1;
                    }
                    if i == start {
                        return Err(fail(i, "empty key"));
                    }
                    segments.push(SelectorSegment::Key(chars[start..i].iter().collect()));
                }
                None => return Err(fail(i, "expected a key")),
            }

            while chars.get(i) == Some(&'[') {
                let open = i;
                i += 1;
                if chars.get(i) == Some(&'*') && chars.get(i + 1) == Some(&']') {
                    segments.push(SelectorSegment::Wildcard);
                    i += 2;
                    continue;
                }
                let digits_start = i;
                while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                    i += 1;
                }
                if i == digits_start {
                    return Err(fail(i, "expected an index or '*' after '['"));
                }
                if chars.get(i) != Some(&']') {
                    return Err(fail(open, "unclosed '['"));
                }
                let digits: String = chars[digits_start..i].iter().collect();
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| fail(digits_start, "index out of range"))?;
                segments.push(SelectorSegment::Index(index));
                i += 1;
            }

            match chars.get(i) {
                None => break,
                Some('.') => {
                    i += 1;
                    if i == chars.len() {
                        return Err(fail(i - 1, "trailing '.'"));
                    }
                }
                Some(c) => return Err(fail(i, &format!("unexpected '{}'", c))),
            }
        }

        Ok(Self {
            source: text.to_string(),
            segments,
        })
    }

    /// The parsed segments.
    pub fn segments(&self) -> &[SelectorSegment] {
        &self.segments
    }

    /// Whether any segment can match more than one node.
    pub fn has_wildcard(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, SelectorSegment::Wildcard))
    }

    /// The original selector text.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> SelectorSegment {
        SelectorSegment::Key(s.to_string())
    }

    #[test]
    fn parses_nested_keys() {
        let selector = Selector::parse("listen.port").unwrap();
        assert_eq!(selector.segments(), &[key("listen"), key("port")]);
        assert!(!selector.has_wildcard());
    }

    #[test]
    fn parses_indexes_and_wildcards() {
        let selector = Selector::parse("servers[1].hosts[*]").unwrap();
        assert_eq!(
            selector.segments(),
            &[
                key("servers"),
                SelectorSegment::Index(1),
                key("hosts"),
                SelectorSegment::Wildcard
            ]
        );
        assert!(selector.has_wildcard());
    }

    #[test]
    fn star_segment_is_wildcard() {
        let selector = Selector::parse("servers.*.port").unwrap();
        assert_eq!(selector.segments()[1], SelectorSegment::Wildcard);
    }

    #[test]
    fn star_inside_key_is_literal() {
        let selector = Selector::parse("*glob").unwrap();
        assert_eq!(selector.segments(), &[key("*glob")]);
    }

    #[test]
    fn parses_quoted_keys() {
        let selector = Selector::parse("logging.\"log.level\"").unwrap();
        assert_eq!(selector.segments(), &[key("logging"), key("log.level")]);
    }

    #[test]
    fn leading_index_addresses_root_sequence() {
        let selector = Selector::parse("[0].name").unwrap();
        assert_eq!(
            selector.segments(),
            &[SelectorSegment::Index(0), key("name")]
        );
    }

    #[test]
    fn rejects_malformed_selectors() {
        assert_eq!(Selector::parse("").unwrap_err().offset, 0);
        assert_eq!(Selector::parse("a..b").unwrap_err().offset, 2);
        assert_eq!(Selector::parse("a.").unwrap_err().offset, 1);
        assert_eq!(Selector::parse("a[x]").unwrap_err().offset, 2);
        assert_eq!(Selector::parse("a[1").unwrap_err().offset, 1);
        assert_eq!(Selector::parse("a b").unwrap_err().offset, 1);
        assert!(Selector::parse("\"open").is_err());
    }

    #[test]
    fn display_round_trips_source() {
        let selector: Selector = "servers[*].port".parse().unwrap();
        assert_eq!(selector.to_string(), "servers[*].port");
        assert_eq!(selector.as_str(), "servers[*].port");
    }
}
