//! Scalar typing and source extents.
//!
//! YAML and key-value loaders only get strings back from their parsers.
//! The helpers here decide the type of an unquoted scalar and measure how
//! many characters of the source line the scalar occupies.

use super::node::ConfigValue;

/// Type an unquoted scalar the way YAML's core schema would.
pub fn infer_plain(text: &str) -> ConfigValue {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return ConfigValue::Null,
        "true" | "True" | "TRUE" => return ConfigValue::Bool(true),
        "false" | "False" | "FALSE" => return ConfigValue::Bool(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return ConfigValue::Float(f64::INFINITY)
        }
        "-.inf" | "-.Inf" | "-.INF" => return ConfigValue::Float(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return ConfigValue::Float(f64::NAN),
        _ => {}
    }

    if let Some(n) = parse_integer(text) {
        return ConfigValue::Integer(n);
    }

    if looks_numeric(text) {
        if let Ok(n) = text.parse::<f64>() {
            return ConfigValue::Float(n);
        }
    }

    ConfigValue::String(text.to_string())
}

fn parse_integer(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let magnitude = if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(octal) = digits.strip_prefix("0o") {
        i64::from_str_radix(octal, 8).ok()?
    } else if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        digits.parse::<i64>().ok()?
    } else {
        return None;
    };

    Some(if negative { -magnitude } else { magnitude })
}

fn looks_numeric(text: &str) -> bool {
    let body = text.trim_start_matches(&['+', '-'][..]);
    body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && body.chars().any(|c| c.is_ascii_digit())
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
}

/// Where a scalar sits on its source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarExtent {
    /// Column of the first character (quotes included).
    pub col: usize,
    /// Length in characters, quotes included.
    pub length: usize,
    /// Quoted or block scalar; such scalars are always strings.
    pub quoted: bool,
    /// The characters between the delimiters are exactly the scalar value,
    /// so offsets into the value map one-to-one onto columns.
    pub exact: bool,
}

impl ScalarExtent {
    /// Column of the first character of the value itself.
    pub fn value_col(&self) -> usize {
        if self.quoted {
            self.col + 1
        } else {
            self.col
        }
    }
}

/// Line-indexed view of a source text.
#[derive(Debug, Clone)]
pub struct SourceText<'a> {
    lines: Vec<&'a str>,
}

impl<'a> SourceText<'a> {
    /// Split a source text into lines.
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
        }
    }

    /// A line by 1-indexed row.
    pub fn line(&self, row: usize) -> Option<&'a str> {
        self.lines.get(row.checked_sub(1)?).copied()
    }

    /// Measure the scalar `value` whose parser-reported start is `(row, col)`.
    pub fn extent(&self, row: usize, col: usize, value: &str) -> ScalarExtent {
        let Some(line) = self.line(row) else {
            return ScalarExtent {
                col,
                length: 0,
                quoted: false,
                exact: false,
            };
        };
        let chars: Vec<char> = line.chars().collect();
        let wanted: Vec<char> = value.chars().collect();
        let mut start = col.saturating_sub(1).min(chars.len());

        // Some parsers report the first character after an opening quote.
        if start > 0 {
            if let Some(&q) = chars.get(start - 1).filter(|c| matches!(c, '"' | '\'')) {
                let end = start + wanted.len();
                if chars[start..].starts_with(&wanted) && chars.get(end) == Some(&q) {
                    start -= 1;
                }
            }
        }

        match chars.get(start) {
            Some(&quote @ ('"' | '\'')) => match closing_quote(&chars, start, quote) {
                Some(end) => {
                    let inner: Vec<char> = chars[start + 1..end].to_vec();
                    ScalarExtent {
                        col: start + 1,
                        length: end - start + 1,
                        quoted: true,
                        exact: inner == wanted,
                    }
                }
                None => ScalarExtent {
                    col: start + 1,
                    length: chars.len() - start,
                    quoted: true,
                    exact: false,
                },
            },
            Some('|') | Some('>') => ScalarExtent {
                col: start + 1,
                length: trimmed_len(&chars[start..]),
                quoted: true,
                exact: false,
            },
            _ if wanted.is_empty() => ScalarExtent {
                col: start + 1,
                length: 0,
                quoted: false,
                exact: true,
            },
            _ if chars[start..].starts_with(&wanted) => ScalarExtent {
                col: start + 1,
                length: wanted.len(),
                quoted: false,
                exact: true,
            },
            _ => ScalarExtent {
                col: start + 1,
                length: trimmed_len(&chars[start..]),
                quoted: false,
                exact: false,
            },
        }
    }
}

pub(crate) fn closing_quote(chars: &[char], start: usize, quote: char) -> Option<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if quote == '"' && c == '\\' {
            i += 2;
            continue;
        }
        if c == quote {
            if quote == '\'' && chars.get(i + 1) == Some(&'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Characters up to an inline comment, trailing whitespace removed.
fn trimmed_len(chars: &[char]) -> usize {
    let mut end = chars.len();
    for i in 1..chars.len() {
        if chars[i] == '#' && chars[i - 1].is_whitespace() {
            end = i;
            break;
        }
    }
    while end > 0 && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_scalar_types() {
        assert_eq!(infer_plain("8080"), ConfigValue::Integer(8080));
        assert_eq!(infer_plain("-12"), ConfigValue::Integer(-12));
        assert_eq!(infer_plain("0x1F"), ConfigValue::Integer(31));
        assert_eq!(infer_plain("1.5"), ConfigValue::Float(1.5));
        assert_eq!(infer_plain("1e3"), ConfigValue::Float(1000.0));
        assert_eq!(infer_plain("true"), ConfigValue::Bool(true));
        assert_eq!(infer_plain("FALSE"), ConfigValue::Bool(false));
        assert_eq!(infer_plain("~"), ConfigValue::Null);
        assert_eq!(infer_plain(""), ConfigValue::Null);
        assert_eq!(infer_plain("abc"), ConfigValue::String("abc".into()));
    }

    #[test]
    fn words_rust_would_parse_as_floats_stay_strings() {
        assert_eq!(infer_plain("inf"), ConfigValue::String("inf".into()));
        assert_eq!(infer_plain("NaN"), ConfigValue::String("NaN".into()));
        assert_eq!(infer_plain("1.2.3"), ConfigValue::String("1.2.3".into()));
    }

    #[test]
    fn measures_plain_scalar() {
        let source = SourceText::new("name: api\nport:  8080 # http\n");
        let extent = source.extent(2, 8, "8080");

        assert_eq!(extent.col, 8);
        assert_eq!(extent.length, 4);
        assert!(!extent.quoted);
        assert!(extent.exact);
    }

    #[test]
    fn measures_double_quoted_scalar() {
        let source = SourceText::new("port:  \"abc\"\n");
        let extent = source.extent(1, 8, "abc");

        assert_eq!((extent.col, extent.length), (8, 5));
        assert!(extent.quoted);
        assert!(extent.exact);
        assert_eq!(extent.value_col(), 9);
    }

    #[test]
    fn marker_after_quote_is_pulled_back() {
        let source = SourceText::new("port:  \"abc\"\n");
        let extent = source.extent(1, 9, "abc");

        assert_eq!((extent.col, extent.length), (8, 5));
        assert!(extent.quoted);
    }

    #[test]
    fn escaped_quotes_are_not_exact() {
        let source = SourceText::new(r#"msg: "say \"hi\"""#);
        let extent = source.extent(1, 6, "say \"hi\"");

        assert_eq!(extent.length, 12);
        assert!(extent.quoted);
        assert!(!extent.exact);
    }

    #[test]
    fn single_quotes_with_doubled_quote() {
        let source = SourceText::new("msg: 'it''s'");
        let extent = source.extent(1, 6, "it's");

        assert_eq!(extent.length, 7);
        assert!(!extent.exact);
    }

    #[test]
    fn folded_plain_scalar_uses_rest_of_line() {
        let source = SourceText::new("text: first\n  second\n");
        let extent = source.extent(1, 7, "first second");

        assert_eq!(extent.length, 5);
        assert!(!extent.exact);
    }

    #[test]
    fn missing_line_is_empty() {
        let source = SourceText::new("a: 1");
        assert_eq!(source.extent(5, 1, "x").length, 0);
    }
}
