//! Check expressions.
//!
//! A rule's `check` is a small boolean expression over check functions:
//!
//! ```text
//! range(1, 65535)
//! string && matches("^[a-z]+$") && !oneof("root", "admin")
//! each(map && len(1, 10)) || null
//! ge(@limits.min)
//! ```
//!
//! Expressions compile into a closed [`Predicate`] tree. Unknown function
//! names are rejected here, so evaluation never dispatches on strings.

use std::fmt;

use regex::Regex;

use crate::config::{ConfigValue, Selector};

/// Check functions understood by [`parse_predicate`], with a short summary.
pub const CHECK_FUNCTIONS: &[(&str, &str)] = &[
    ("int", "value is an integer"),
    ("float", "value is a number (integer or float)"),
    ("bool", "value is a boolean"),
    ("string", "value is a string"),
    ("list", "value is a list"),
    ("map", "value is a map"),
    ("null", "value is null"),
    ("range(lo, hi)", "number between lo and hi, inclusive"),
    ("min(n)", "number at least n"),
    ("max(n)", "number at most n"),
    ("len(lo[, hi])", "string, list or map length within bounds"),
    ("nonempty", "value is not null or empty"),
    ("matches(\"re\")", "string matching a regular expression"),
    ("oneof(v, ...)", "value equals one of the given literals"),
    ("eq(v) ne(v)", "equality with a literal or @field"),
    ("lt(v) le(v) gt(v) ge(v)", "ordering against a literal or @field"),
    ("contains(v)", "list item, substring or map key"),
    ("unique", "list items are pairwise distinct"),
    ("each(expr)", "every list item or map value satisfies expr"),
];

/// Value types a rule can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    /// Any number, integers included.
    Float,
    Bool,
    String,
    List,
    Map,
    Null,
    Any,
}

impl ValueType {
    /// Look up a type by name, accepting the usual aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" | "integer" => Some(Self::Integer),
            "float" | "number" => Some(Self::Float),
            "bool" | "boolean" => Some(Self::Bool),
            "string" | "str" => Some(Self::String),
            "list" | "array" | "sequence" => Some(Self::List),
            "map" | "mapping" | "object" => Some(Self::Map),
            "null" => Some(Self::Null),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    /// Whether `value` is of this type.
    pub fn matches(&self, value: &ConfigValue) -> bool {
        match self {
            Self::Integer => matches!(value, ConfigValue::Integer(_)),
            Self::Float => matches!(value, ConfigValue::Integer(_) | ConfigValue::Float(_)),
            Self::Bool => matches!(value, ConfigValue::Bool(_)),
            Self::String => matches!(value, ConfigValue::String(_)),
            Self::List => matches!(value, ConfigValue::Sequence(_)),
            Self::Map => matches!(value, ConfigValue::Mapping(_)),
            Self::Null => matches!(value, ConfigValue::Null),
            Self::Any => true,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Float => "number",
            Self::Bool => "boolean",
            Self::String => "string",
            Self::List => "list",
            Self::Map => "map",
            Self::Null => "null",
            Self::Any => "any value",
        };
        write!(f, "{}", name)
    }
}

/// A scalar written in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Literal {
    /// The equivalent configuration value.
    pub fn to_value(&self) -> ConfigValue {
        match self {
            Literal::Null => ConfigValue::Null,
            Literal::Bool(b) => ConfigValue::Bool(*b),
            Literal::Integer(n) => ConfigValue::Integer(*n),
            Literal::Float(n) => ConfigValue::Float(*n),
            Literal::String(s) => ConfigValue::String(s.clone()),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Integer(n) => Some(*n as f64),
            Literal::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// A reference to another field, optionally in another declared file.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    /// File alias; `None` means the file the rule is checking.
    pub file: Option<String>,
    pub selector: Selector,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "@{}:{}", file, self.selector),
            None => write!(f, "@{}", self.selector),
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Literal),
    Field(FieldRef),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(literal) => write!(f, "{}", literal),
            Operand::Field(field) => write!(f, "{}", field),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "lt" => Some(Self::Lt),
            "le" => Some(Self::Le),
            "gt" => Some(Self::Gt),
            "ge" => Some(Self::Ge),
            _ => None,
        }
    }

    /// Operator symbol used in explanations.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Whether the operator needs an ordering rather than just equality.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Self::Eq | Self::Ne)
    }
}

/// A compiled regular expression that compares by its source.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// A compiled check expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Type(ValueType),
    /// Inclusive numeric bounds; either side may be open.
    Range { min: Option<f64>, max: Option<f64> },
    Length { min: usize, max: Option<usize> },
    NonEmpty,
    Matches(Pattern),
    OneOf(Vec<Literal>),
    Compare { op: CompareOp, operand: Operand },
    Contains(Literal),
    Unique,
    Each(Box<Predicate>),
    Not(Box<Predicate>),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    /// What a value must look like to satisfy this predicate.
    pub fn describe(&self) -> String {
        match self {
            Predicate::Type(t) => t.to_string(),
            Predicate::Range {
                min: Some(min),
                max: Some(max),
            } => format!("a number in [{}, {}]", min, max),
            Predicate::Range {
                min: Some(min),
                max: None,
            } => format!("a number >= {}", min),
            Predicate::Range {
                min: None,
                max: Some(max),
            } => format!("a number <= {}", max),
            Predicate::Range {
                min: None,
                max: None,
            } => "a number".to_string(),
            Predicate::Length { min, max: Some(max) } if min == max => {
                format!("length {}", min)
            }
            Predicate::Length { min, max: Some(max) } => {
                format!("length between {} and {}", min, max)
            }
            Predicate::Length { min, max: None } => format!("length of at least {}", min),
            Predicate::NonEmpty => "a non-empty value".to_string(),
            Predicate::Matches(pattern) => format!("a string matching /{}/", pattern.as_str()),
            Predicate::OneOf(options) => {
                let options: Vec<String> = options.iter().map(|o| o.to_string()).collect();
                format!("one of [{}]", options.join(", "))
            }
            Predicate::Compare { op, operand } => format!("a value {} {}", op.symbol(), operand),
            Predicate::Contains(literal) => format!("a value containing {}", literal),
            Predicate::Unique => "a list of unique items".to_string(),
            Predicate::Each(inner) => format!("every item to be {}", inner.describe()),
            Predicate::Not(inner) => format!("not {}", inner.describe()),
            Predicate::All(terms) => join_terms(terms, " and "),
            Predicate::Any(terms) => join_terms(terms, " or "),
        }
    }

    /// Every field reference in this predicate, in source order.
    pub fn field_refs(&self) -> Vec<&FieldRef> {
        match self {
            Predicate::Compare {
                operand: Operand::Field(field),
                ..
            } => vec![field],
            Predicate::Each(inner) | Predicate::Not(inner) => inner.field_refs(),
            Predicate::All(terms) | Predicate::Any(terms) => {
                terms.iter().flat_map(|t| t.field_refs()).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn join_terms(terms: &[Predicate], separator: &str) -> String {
    terms
        .iter()
        .map(|t| match t {
            Predicate::All(_) | Predicate::Any(_) => format!("({})", t.describe()),
            _ => t.describe(),
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Why an expression failed to compile. Offsets count characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    Syntax {
        offset: usize,
        length: usize,
        message: String,
    },
    UnknownFunction {
        offset: usize,
        length: usize,
        name: String,
    },
}

impl ExprError {
    fn syntax(offset: usize, length: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            length,
            message: message.into(),
        }
    }

    /// Character span of the offending text.
    pub fn span(&self) -> (usize, usize) {
        match self {
            Self::Syntax { offset, length, .. } | Self::UnknownFunction { offset, length, .. } => {
                (*offset, *length)
            }
        }
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { message, .. } => write!(f, "{}", message),
            Self::UnknownFunction { name, .. } => write!(f, "unknown check function '{}'", name),
        }
    }
}

impl std::error::Error for ExprError {}

/// Deepest nesting of `(`, `!` and `each` a check may use.
pub const MAX_NESTING: usize = 128;

/// Compile a check expression.
pub fn parse_predicate(source: &str) -> Result<Predicate, ExprError> {
    let lexemes = lex(source)?;
    let mut parser = ExprParser {
        lexemes,
        pos: 0,
        end: source.chars().count(),
        depth: 0,
    };
    let predicate = parser.expr()?;
    if let Some(extra) = parser.peek() {
        return Err(ExprError::syntax(
            extra.offset,
            extra.length,
            "unexpected input after expression",
        ));
    }
    Ok(predicate)
}

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Ref(FieldRef),
    LParen,
    RParen,
    Comma,
    And,
    Or,
    Bang,
}

#[derive(Debug, Clone)]
struct Spanned {
    lexeme: Lexeme,
    offset: usize,
    length: usize,
}

fn lex(source: &str) -> Result<Vec<Spanned>, ExprError> {
    let chars: Vec<char> = source.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let lexeme = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => {
                i += 1;
                Lexeme::LParen
            }
            ')' => {
                i += 1;
                Lexeme::RParen
            }
            ',' => {
                i += 1;
                Lexeme::Comma
            }
            '!' => {
                i += 1;
                Lexeme::Bang
            }
            '&' | '|' => {
                if chars.get(i + 1) != Some(&c) {
                    return Err(ExprError::syntax(i, 1, format!("expected '{}{}'", c, c)));
                }
                i += 2;
                if c == '&' {
                    Lexeme::And
                } else {
                    Lexeme::Or
                }
            }
            '"' => {
                let (text, end) = lex_string(&chars, i)?;
                i = end;
                Lexeme::Str(text)
            }
            '@' => {
                let (field, end) = lex_field(&chars, i)?;
                i = end;
                Lexeme::Ref(field)
            }
            c if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) => {
                i += 1;
                while chars
                    .get(i)
                    .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E'))
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                if let Ok(n) = text.parse::<i64>() {
                    Lexeme::Int(n)
                } else if let Ok(n) = text.parse::<f64>() {
                    Lexeme::Float(n)
                } else {
                    return Err(ExprError::syntax(
                        start,
                        i - start,
                        format!("invalid number '{}'", text),
                    ));
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                while chars
                    .get(i)
                    .is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_')
                {
                    i += 1;
                }
                Lexeme::Ident(chars[start..i].iter().collect())
            }
            other => {
                return Err(ExprError::syntax(
                    i,
                    1,
                    format!("unexpected character '{}'", other),
                ))
            }
        };
        out.push(Spanned {
            lexeme,
            offset: start,
            length: i - start,
        });
    }

    Ok(out)
}

/// A double-quoted string starting at `start`; returns the text and the
/// index just past the closing quote.
fn lex_string(chars: &[char], start: usize) -> Result<(String, usize), ExprError> {
    let mut text = String::new();
    let mut i = start + 1;
    loop {
        match chars.get(i) {
            Some('"') => return Ok((text, i + 1)),
            Some('\\') => {
                let escaped = match chars.get(i + 1) {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some(&c) => c,
                    None => break,
                };
                text.push(escaped);
                i += 2;
            }
            Some(&c) => {
                text.push(c);
                i += 1;
            }
            None => break,
        }
    }
    Err(ExprError::syntax(
        start,
        chars.len() - start,
        "unterminated string",
    ))
}

/// `@[alias:]selector`, ending at a comma, closing paren or whitespace
/// outside quotes.
fn lex_field(chars: &[char], start: usize) -> Result<(FieldRef, usize), ExprError> {
    let mut i = start + 1;
    let mut quoted = false;
    while let Some(&c) = chars.get(i) {
        if c == '"' {
            quoted = !quoted;
        } else if !quoted && (matches!(c, ',' | ')') || c.is_whitespace()) {
            break;
        } else if quoted && c == '\\' {
            i += 1;
        }
        i += 1;
    }
    let end = i.min(chars.len());
    let body: String = chars[start + 1..end].iter().collect();

    let alias_len = body
        .find(':')
        .filter(|&at| {
            at > 0
                && body[..at]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        })
        .map(|at| body[..at].chars().count());
    let (file, selector_text, selector_offset) = match alias_len {
        Some(n) => {
            let alias: String = body.chars().take(n).collect();
            let rest: String = body.chars().skip(n + 1).collect();
            (Some(alias), rest, start + 1 + n + 1)
        }
        None => (None, body, start + 1),
    };

    let selector = Selector::parse(&selector_text).map_err(|e| {
        ExprError::syntax(
            selector_offset + e.offset,
            1,
            format!("invalid field reference: {}", e.message),
        )
    })?;
    if selector.has_wildcard() {
        return Err(ExprError::syntax(
            start,
            end - start,
            "field references must name a single field (no wildcards)",
        ));
    }

    Ok((FieldRef { file, selector }, end))
}

/// A parsed function argument with its span.
struct Arg {
    value: ArgValue,
    offset: usize,
    length: usize,
}

enum ArgValue {
    Literal(Literal),
    Field(FieldRef),
}

struct ExprParser {
    lexemes: Vec<Spanned>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Spanned> {
        self.lexemes.get(self.pos)
    }

    fn peek_is(&self, lexeme: &Lexeme) -> bool {
        self.peek().is_some_and(|s| &s.lexeme == lexeme)
    }

    fn bump(&mut self) -> Option<Spanned> {
        let next = self.lexemes.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    /// Error at the next lexeme, or at the end of input.
    fn error_here(&self, message: &str) -> ExprError {
        match self.peek() {
            Some(s) => ExprError::syntax(s.offset, s.length, message),
            None => ExprError::syntax(self.end, 0, message),
        }
    }

    fn expect(&mut self, lexeme: Lexeme, what: &str) -> Result<Spanned, ExprError> {
        if self.peek_is(&lexeme) {
            if let Some(s) = self.bump() {
                return Ok(s);
            }
        }
        Err(self.error_here(&format!("expected {}", what)))
    }

    /// Enter one nesting level opened by the lexeme at `offset`.
    fn descend(&mut self, offset: usize, length: usize) -> Result<(), ExprError> {
        if self.depth >= MAX_NESTING {
            return Err(ExprError::syntax(
                offset,
                length,
                format!("check nests deeper than {} levels", MAX_NESTING),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn expr(&mut self) -> Result<Predicate, ExprError> {
        let mut terms = vec![self.and()?];
        while self.peek_is(&Lexeme::Or) {
            self.bump();
            terms.push(self.and()?);
        }
        Ok(collapse(terms, Predicate::Any))
    }

    fn and(&mut self) -> Result<Predicate, ExprError> {
        let mut terms = vec![self.unary()?];
        while self.peek_is(&Lexeme::And) {
            self.bump();
            terms.push(self.unary()?);
        }
        Ok(collapse(terms, Predicate::All))
    }

    fn unary(&mut self) -> Result<Predicate, ExprError> {
        if self.peek_is(&Lexeme::Bang) {
            if let Some(bang) = self.bump() {
                self.descend(bang.offset, bang.length)?;
                let inner = self.unary()?;
                self.ascend();
                return Ok(Predicate::Not(Box::new(inner)));
            }
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Predicate, ExprError> {
        let Some(next) = self.bump() else {
            return Err(self.error_here("expected a check"));
        };
        match next.lexeme {
            Lexeme::LParen => {
                self.descend(next.offset, next.length)?;
                let inner = self.expr()?;
                self.expect(Lexeme::RParen, "')'")?;
                self.ascend();
                Ok(inner)
            }
            Lexeme::Ident(name) => self.function(&name, next.offset, next.length),
            _ => Err(ExprError::syntax(
                next.offset,
                next.length,
                "expected a check function",
            )),
        }
    }

    fn function(&mut self, name: &str, offset: usize, length: usize) -> Result<Predicate, ExprError> {
        let arity = |message: &str| ExprError::syntax(offset, length, format!("{}: {}", name, message));

        if name == "each" {
            self.expect(Lexeme::LParen, "'(' after each")?;
            self.descend(offset, length)?;
            let inner = self.expr()?;
            self.expect(Lexeme::RParen, "')'")?;
            self.ascend();
            return Ok(Predicate::Each(Box::new(inner)));
        }

        let args = if self.peek_is(&Lexeme::LParen) {
            self.args()?
        } else {
            Vec::new()
        };

        if let Some(value_type) = match name {
            "any" => None,
            other => ValueType::from_name(other),
        } {
            if !args.is_empty() {
                return Err(arity("takes no arguments"));
            }
            return Ok(Predicate::Type(value_type));
        }

        match name {
            "nonempty" | "unique" => {
                if !args.is_empty() {
                    return Err(arity("takes no arguments"));
                }
                Ok(if name == "nonempty" {
                    Predicate::NonEmpty
                } else {
                    Predicate::Unique
                })
            }
            "range" => {
                let [lo, hi] = args.as_slice() else {
                    return Err(arity("expects range(lo, hi)"));
                };
                let (min, max) = (number(lo)?, number(hi)?);
                if min > max {
                    return Err(ExprError::syntax(
                        lo.offset,
                        hi.offset + hi.length - lo.offset,
                        format!("inverted range: {} is greater than {}", min, max),
                    ));
                }
                Ok(Predicate::Range {
                    min: Some(min),
                    max: Some(max),
                })
            }
            "min" | "max" => {
                let [bound] = args.as_slice() else {
                    return Err(arity("expects exactly one number"));
                };
                let bound = number(bound)?;
                Ok(if name == "min" {
                    Predicate::Range {
                        min: Some(bound),
                        max: None,
                    }
                } else {
                    Predicate::Range {
                        min: None,
                        max: Some(bound),
                    }
                })
            }
            "len" => match args.as_slice() {
                [lo] => Ok(Predicate::Length {
                    min: count(lo)?,
                    max: None,
                }),
                [lo, hi] => {
                    let (min, max) = (count(lo)?, count(hi)?);
                    if min > max {
                        return Err(ExprError::syntax(
                            lo.offset,
                            hi.offset + hi.length - lo.offset,
                            format!("inverted length bounds: {} is greater than {}", min, max),
                        ));
                    }
                    Ok(Predicate::Length {
                        min,
                        max: Some(max),
                    })
                }
                _ => Err(arity("expects len(lo) or len(lo, hi)")),
            },
            "matches" => {
                let [arg] = args.as_slice() else {
                    return Err(arity("expects one pattern string"));
                };
                let ArgValue::Literal(Literal::String(source)) = &arg.value else {
                    return Err(ExprError::syntax(arg.offset, arg.length, "expected a string"));
                };
                let pattern = Pattern::new(source).map_err(|e| {
                    ExprError::syntax(
                        arg.offset,
                        arg.length,
                        format!("invalid regular expression: {}", e),
                    )
                })?;
                Ok(Predicate::Matches(pattern))
            }
            "oneof" => {
                if args.is_empty() {
                    return Err(arity("expects at least one value"));
                }
                let options = args.iter().map(literal).collect::<Result<Vec<_>, _>>()?;
                Ok(Predicate::OneOf(options))
            }
            "contains" => {
                let [arg] = args.as_slice() else {
                    return Err(arity("expects exactly one value"));
                };
                Ok(Predicate::Contains(literal(arg)?))
            }
            _ => {
                let Some(op) = CompareOp::from_name(name) else {
                    return Err(ExprError::UnknownFunction {
                        offset,
                        length,
                        name: name.to_string(),
                    });
                };
                let [arg] = args.as_slice() else {
                    return Err(arity("expects exactly one value or @field"));
                };
                let operand = match &arg.value {
                    ArgValue::Field(field) => Operand::Field(field.clone()),
                    ArgValue::Literal(lit) => {
                        if op.is_ordering()
                            && !matches!(
                                lit,
                                Literal::Integer(_) | Literal::Float(_) | Literal::String(_)
                            )
                        {
                            return Err(ExprError::syntax(
                                arg.offset,
                                arg.length,
                                "ordering needs a number or a string",
                            ));
                        }
                        Operand::Literal(lit.clone())
                    }
                };
                Ok(Predicate::Compare { op, operand })
            }
        }
    }

    /// `( [arg ("," arg)*] )`
    fn args(&mut self) -> Result<Vec<Arg>, ExprError> {
        self.expect(Lexeme::LParen, "'('")?;
        let mut args = Vec::new();
        if self.peek_is(&Lexeme::RParen) {
            self.bump();
            return Ok(args);
        }
        loop {
            args.push(self.arg()?);
            match self.bump() {
                Some(Spanned {
                    lexeme: Lexeme::Comma,
                    ..
                }) => continue,
                Some(Spanned {
                    lexeme: Lexeme::RParen,
                    ..
                }) => break,
                Some(other) => {
                    return Err(ExprError::syntax(
                        other.offset,
                        other.length,
                        "expected ',' or ')'",
                    ))
                }
                None => return Err(ExprError::syntax(self.end, 0, "expected ')'")),
            }
        }
        Ok(args)
    }

    fn arg(&mut self) -> Result<Arg, ExprError> {
        let Some(next) = self.bump() else {
            return Err(ExprError::syntax(self.end, 0, "expected an argument"));
        };
        let value = match next.lexeme {
            Lexeme::Int(n) => ArgValue::Literal(Literal::Integer(n)),
            Lexeme::Float(n) => ArgValue::Literal(Literal::Float(n)),
            Lexeme::Str(s) => ArgValue::Literal(Literal::String(s)),
            Lexeme::Ref(field) => ArgValue::Field(field),
            Lexeme::Ident(ref word) if word == "true" => ArgValue::Literal(Literal::Bool(true)),
            Lexeme::Ident(ref word) if word == "false" => ArgValue::Literal(Literal::Bool(false)),
            Lexeme::Ident(ref word) if word == "null" => ArgValue::Literal(Literal::Null),
            _ => {
                return Err(ExprError::syntax(
                    next.offset,
                    next.length,
                    "expected a literal or @field",
                ))
            }
        };
        Ok(Arg {
            value,
            offset: next.offset,
            length: next.length,
        })
    }
}

fn collapse(mut terms: Vec<Predicate>, combine: fn(Vec<Predicate>) -> Predicate) -> Predicate {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        combine(terms)
    }
}

fn literal(arg: &Arg) -> Result<Literal, ExprError> {
    match &arg.value {
        ArgValue::Literal(lit) => Ok(lit.clone()),
        ArgValue::Field(_) => Err(ExprError::syntax(
            arg.offset,
            arg.length,
            "expected a literal, not a field reference",
        )),
    }
}

fn number(arg: &Arg) -> Result<f64, ExprError> {
    literal(arg)?
        .as_f64()
        .ok_or_else(|| ExprError::syntax(arg.offset, arg.length, "expected a number"))
}

fn count(arg: &Arg) -> Result<usize, ExprError> {
    match literal(arg)? {
        Literal::Integer(n) if n >= 0 => Ok(n as usize),
        _ => Err(ExprError::syntax(
            arg.offset,
            arg.length,
            "expected a non-negative integer",
        )),
    }
}
