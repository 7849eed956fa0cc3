//! Configuration loading and located configuration trees.
//!
//! This module handles everything about the files being checked:
//! - Located trees in [`node`]
//! - Path selectors in [`selector`]
//! - Format detection in [`format`]
//! - Format readers in [`yaml`], [`json`] and [`keyvalue`]
//! - File access and loading in [`loader`]
//!
//! # Example
//!
//! ```
//! use configmate::config::{parse_config, ConfigFormat, Selector};
//! use std::path::Path;
//!
//! let doc = parse_config("listen:\n  port: 8080\n", Path::new("app.yml"), ConfigFormat::Yaml)
//!     .unwrap();
//! let selector: Selector = "listen.port".parse().unwrap();
//! let port = doc.select(&selector).found[0];
//!
//! assert_eq!(port.token.row, 2);
//! assert_eq!(port.token.col, 9);
//! ```

pub mod format;
pub mod json;
pub mod keyvalue;
pub mod loader;
pub mod node;
pub mod scalar;
pub mod selector;
pub mod yaml;

pub use format::ConfigFormat;
pub use loader::{
    load_config, load_config_file, parse_config, resolve_format, FileSource, FsSource,
    MemorySource,
};
pub use node::{
    ConfigDocument, ConfigNode, ConfigValue, Lookup, MapEntry, MissingBranch, NodePath,
    PathSegment, Selection, ValueKind,
};
pub use selector::{Selector, SelectorError, SelectorSegment};
