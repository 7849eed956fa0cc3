//! Rulebooks.
//!
//! A rulebook names the configuration files to check and the rules to apply
//! to them:
//!
//! ```yaml
//! name: web service
//! files:
//!   server: config/server.yaml
//!   env: { path: .env, format: env }
//! rules:
//!   - id: R1
//!     file: server
//!     field: listen.port
//!     type: int
//!     check: range(1, 65535)
//!   - id: R2
//!     file: env
//!     field: LOG_LEVEL
//!     check: oneof("debug", "info", "warn")
//!     optional: true
//! ```
//!
//! - Rule types and the check language live in [`expr`]
//! - Turning source text into a [`Rulebook`] lives in [`parser`]

pub mod expr;
pub mod parser;

use std::path::PathBuf;

use crate::config::{ConfigFormat, Selector};
use crate::token::Token;

pub use expr::{
    parse_predicate, CompareOp, ExprError, FieldRef, Literal, Operand, Pattern, Predicate,
    ValueType, CHECK_FUNCTIONS,
};
pub use parser::{load_rulebook, parse_rulebook, parse_rulebook_in};

/// A configuration file declared by a rulebook.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSpec {
    /// Name rules use to refer to the file.
    pub alias: String,
    /// Path, already resolved against the rulebook's directory.
    pub path: PathBuf,
    pub format: ConfigFormat,
    /// Token of the alias in the rulebook.
    pub token: Token,
}

/// One rule, compiled and ready to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub description: Option<String>,
    /// File alias; `None` targets every declared file.
    pub file: Option<String>,
    pub field: Selector,
    pub value_type: Option<ValueType>,
    pub check: Option<Predicate>,
    /// Absence of the field passes when set.
    pub optional: bool,
    pub notes: Option<String>,
    /// Defining token: the rule's `id` value.
    pub token: Token,
    pub field_token: Token,
}

impl Rule {
    /// Every token in the rulebook that defines this rule.
    pub fn tokens(&self) -> Vec<&Token> {
        vec![&self.token, &self.field_token]
    }

    /// What a matching value must look like, for explanations.
    pub fn expectation(&self) -> String {
        match (&self.value_type, &self.check) {
            (Some(t), Some(check)) => format!("{} and {}", t, check.describe()),
            (Some(t), None) => t.to_string(),
            (None, Some(check)) => check.describe(),
            (None, None) => "a value".to_string(),
        }
    }
}

/// A parsed rulebook.
#[derive(Debug, Clone, PartialEq)]
pub struct Rulebook {
    pub name: String,
    pub description: Option<String>,
    /// Where the rulebook came from; tokens point into this file.
    pub source: PathBuf,
    /// Declared files, in declaration order.
    pub files: Vec<FileSpec>,
    /// Rules, in declaration order.
    pub rules: Vec<Rule>,
}

impl Rulebook {
    /// Look up a declared file by alias.
    pub fn file(&self, alias: &str) -> Option<&FileSpec> {
        self.files.iter().find(|f| f.alias == alias)
    }

    /// The files a rule applies to, in declaration order.
    pub fn targets(&self, rule: &Rule) -> Vec<&FileSpec> {
        match &rule.file {
            Some(alias) => self.file(alias).into_iter().collect(),
            None => self.files.iter().collect(),
        }
    }
}
