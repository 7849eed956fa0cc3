//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::check::output::OutputFormat;

/// ConfigMate - check configuration files against a rulebook.
#[derive(Debug, Parser)]
#[command(name = "configmate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to settings file (overrides ./.configmate.yml)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Show passing outcomes too
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check the configuration files a rulebook declares
    Check(CheckArgs),

    /// Answer one request read from stdin
    Request(RequestArgs),

    /// Write a starter rulebook
    Init(InitArgs),

    /// List the functions available in rule checks
    Checks,
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CheckArgs {
    /// Rulebook to run
    #[arg(value_name = "RULEBOOK")]
    pub rulebook: PathBuf,

    /// Output format (human, json)
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Seconds before the check is cancelled
    #[arg(long, value_name = "SECS", env = "CONFIGMATE_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Load files and evaluate rules on one thread
    #[arg(long)]
    pub sequential: bool,

    /// Include each failing rule's own location in its outcome
    #[arg(long)]
    pub trace_rules: bool,
}

/// Arguments for the `request` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RequestArgs {
    /// Request method
    #[arg(long, default_value = "POST")]
    pub method: String,

    /// Seconds before the check is cancelled
    #[arg(long, value_name = "SECS", env = "CONFIGMATE_TIMEOUT")]
    pub timeout: Option<u64>,
}

/// Arguments for the `init` command.
#[derive(Debug, Clone, clap::Args)]
pub struct InitArgs {
    /// Where to write the rulebook
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Configuration file to declare (repeatable)
    #[arg(long = "file", value_name = "CONFIG")]
    pub files: Vec<PathBuf>,

    /// Overwrite an existing rulebook
    #[arg(long)]
    pub force: bool,
}
