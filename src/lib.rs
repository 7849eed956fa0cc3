//! ConfigMate - rulebook-driven validation of configuration files.
//!
//! A rulebook declares configuration files and rules about their contents.
//! ConfigMate loads the files, applies every rule, and reports each outcome
//! with the exact source locations involved.
//!
//! # Modules
//!
//! - [`api`] - Transport-agnostic request handling
//! - [`cancel`] - Cancellation and deadlines
//! - [`check`] - Rule evaluation, orchestration and reports
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading and located trees
//! - [`error`] - Error types and result aliases
//! - [`rulebook`] - Rulebook parsing and the check language
//! - [`settings`] - Tool settings
//! - [`token`] - Source location tokens
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```
//! use configmate::cancel::CancellationToken;
//! use configmate::check::{CheckOptions, Checker};
//! use configmate::config::MemorySource;
//! use std::path::Path;
//!
//! let source = MemorySource::new()
//!     .with_file("server.yaml", "port: 8080\n")
//!     .with_file(
//!         "rules.yml",
//!         "name: web\nfiles:\n  server: server.yaml\nrules:\n  - id: R1\n    field: port\n    type: int\n",
//!     );
//! let mut checker = Checker::with_source(Box::new(source), CheckOptions::default());
//! let report = checker.check_path(Path::new("rules.yml"), &CancellationToken::new());
//!
//! assert!(report.passed());
//! assert_eq!(report.len(), 1);
//! ```

pub mod api;
pub mod cancel;
pub mod check;
pub mod cli;
pub mod config;
pub mod error;
pub mod rulebook;
pub mod settings;
pub mod token;
pub mod ui;

pub use error::{ConfigMateError, Result};
