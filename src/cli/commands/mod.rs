//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`configmate check`, `configmate init`)
//! - Shared settings loading
//! - Consistent global flag handling

pub mod check;
pub mod checks;
pub mod dispatcher;
pub mod init;
pub mod request;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
