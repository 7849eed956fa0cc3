//! Running rulebooks against configuration files.
//!
//! - Outcomes and reports in [`outcome`]
//! - Predicate evaluation in [`predicate`]
//! - Applying one rule to one file in [`evaluator`]
//! - The load-then-evaluate state machine in [`orchestrator`]
//! - Rendering reports in [`output`]

pub mod evaluator;
pub mod orchestrator;
pub mod outcome;
pub mod output;
pub mod predicate;

use std::collections::HashMap;

use crate::config::ConfigDocument;

pub use evaluator::{EvalSettings, Evaluator, DEFAULT_MAX_TOKENS};
pub use orchestrator::{CheckOptions, CheckState, Checker};
pub use outcome::{OutcomeKind, Report, RuleOutcome, CANCELLED_OUTCOME_ID, LOAD_OUTCOME_ID};
pub use output::{HumanFormatter, JsonFormatter, ReportFormatter};

/// Loaded documents keyed by file alias.
pub type Documents = HashMap<String, ConfigDocument>;
