//! Error types for ConfigMate operations.
//!
//! This module defines [`ConfigMateError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Rulebook and config problems (`Syntax`, `UnknownRule`, `FileNotFound`,
//!   `Parse`) are recoverable: the orchestrator turns them into a single
//!   failing outcome instead of surfacing them to the caller.
//! - `Evaluation` marks a defect in rule configuration. It still surfaces
//!   as an outcome, but is logged at a higher severity.
//! - Use `anyhow::Error` (via `ConfigMateError::Other`) for unexpected errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::token::Token;

/// Core error type for ConfigMate operations.
#[derive(Debug, Error)]
pub enum ConfigMateError {
    /// Malformed rulebook grammar.
    #[error("Syntax error at {token}: {message}")]
    Syntax { message: String, token: Token },

    /// Rulebook references a rule type or check function that does not exist.
    #[error("Unknown rule type '{name}' in rule '{rule}' at {token}")]
    UnknownRule {
        rule: String,
        name: String,
        token: Token,
    },

    /// A referenced file does not exist.
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf, token: Token },

    /// A configuration file could not be parsed.
    #[error("Failed to parse {}: {message}", token.file.display())]
    Parse { message: String, token: Token },

    /// Internal contract violation while evaluating a rule.
    #[error("Evaluation error in rule '{rule}' at {token}: {message}")]
    Evaluation {
        rule: String,
        message: String,
        token: Token,
    },

    /// The check was cancelled or ran out of time.
    #[error("Check cancelled")]
    Cancelled,

    /// Failed to parse the settings file.
    #[error("Failed to parse settings at {}: {message}", path.display())]
    SettingsParse { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConfigMateError {
    /// Source location attached to this error, if any.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::Syntax { token, .. }
            | Self::UnknownRule { token, .. }
            | Self::FileNotFound { token, .. }
            | Self::Parse { token, .. }
            | Self::Evaluation { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Whether this error points at a defect in rule configuration
    /// rather than at the data being checked.
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::Evaluation { .. })
    }

    /// Whether this error points at a located problem in rulebook or config input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Syntax { .. }
                | Self::UnknownRule { .. }
                | Self::FileNotFound { .. }
                | Self::Parse { .. }
        )
    }
}

/// Result type alias for ConfigMate operations.
pub type Result<T> = std::result::Result<T, ConfigMateError>;
