//! Check orchestration.
//!
//! A [`Checker`] moves through three states, strictly forward:
//!
//! 1. `Loading`: parse the rulebook and load every declared file
//! 2. `Evaluating`: apply each rule to each of its target files
//! 3. `Done`: the report is assembled
//!
//! Any load failure jumps straight to `Done` with a single failing outcome,
//! so callers always get a well-formed [`Report`].

use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use super::evaluator::{EvalSettings, Evaluator};
use super::outcome::{Report, RuleOutcome};
use super::Documents;
use crate::cancel::CancellationToken;
use crate::config::{load_config, ConfigDocument, FileSource, FsSource};
use crate::error::{ConfigMateError, Result};
use crate::rulebook::{load_rulebook, parse_rulebook_in, Rule, Rulebook};

const CANCELLED_WHILE_LOADING: &str = "check cancelled while loading; no rules were evaluated";

/// Where a [`Checker`] is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Loading,
    Evaluating,
    Done,
}

/// Options for one check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Load files and evaluate rules on the rayon pool.
    pub parallel: bool,
    pub eval: EvalSettings,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            eval: EvalSettings::default(),
        }
    }
}

/// Runs one rulebook against its configuration files.
///
/// A checker holds no state shared with other checkers; build one per
/// request.
pub struct Checker {
    source: Box<dyn FileSource>,
    options: CheckOptions,
    state: CheckState,
    /// Fires the cancellation token as the task with this index starts.
    #[cfg(test)]
    cancel_from: Option<usize>,
}

impl Checker {
    /// A checker reading from the local filesystem.
    pub fn new(options: CheckOptions) -> Self {
        Self::with_source(Box::new(FsSource), options)
    }

    pub fn with_source(source: Box<dyn FileSource>, options: CheckOptions) -> Self {
        Self {
            source,
            options,
            state: CheckState::Loading,
            #[cfg(test)]
            cancel_from: None,
        }
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    /// Check the rulebook stored at `path`.
    pub fn check_path(&mut self, path: &Path, cancel: &CancellationToken) -> Report {
        self.state = CheckState::Loading;
        info!("Checking rulebook {}", path.display());
        match load_rulebook(self.source.as_ref(), path, cancel) {
            Ok(rulebook) => self.check_rulebook(&rulebook, cancel),
            Err(err) => self.abort(err),
        }
    }

    /// Check inline rulebook text. `origin` names the text in tokens and
    /// relative file paths resolve against `base_dir`.
    pub fn check_text(
        &mut self,
        text: &str,
        origin: &Path,
        base_dir: &Path,
        cancel: &CancellationToken,
    ) -> Report {
        self.state = CheckState::Loading;
        match parse_rulebook_in(text, origin, base_dir) {
            Ok(rulebook) => self.check_rulebook(&rulebook, cancel),
            Err(err) => self.abort(err),
        }
    }

    /// Check an already parsed rulebook.
    pub fn check_rulebook(&mut self, rulebook: &Rulebook, cancel: &CancellationToken) -> Report {
        self.state = CheckState::Loading;
        let documents = match self.load_files(rulebook, cancel) {
            Ok(documents) => documents,
            Err(err) => return self.abort(err),
        };

        self.state = CheckState::Evaluating;
        let report = self.evaluate(rulebook, &documents, cancel);
        debug!(
            "Rulebook '{}' produced {} outcome(s)",
            rulebook.name,
            report.len()
        );
        self.state = CheckState::Done;
        report
    }

    /// Load every declared file. The first failure in declaration order wins.
    fn load_files(&self, rulebook: &Rulebook, cancel: &CancellationToken) -> Result<Documents> {
        let source = self.source.as_ref();
        let load = |spec: &crate::rulebook::FileSpec| -> Result<(String, ConfigDocument)> {
            debug!("Loading {} from {}", spec.alias, spec.path.display());
            let doc = load_config(source, &spec.path, Some(spec.format), cancel)?;
            Ok((spec.alias.clone(), doc))
        };

        let loaded: Vec<Result<(String, ConfigDocument)>> = if self.options.parallel {
            rulebook.files.par_iter().map(load).collect()
        } else {
            rulebook.files.iter().map(load).collect()
        };

        if cancel.is_cancelled() {
            return Err(ConfigMateError::Cancelled);
        }
        loaded.into_iter().collect()
    }

    fn evaluate(
        &self,
        rulebook: &Rulebook,
        documents: &Documents,
        cancel: &CancellationToken,
    ) -> Report {
        let evaluator = Evaluator::new(self.options.eval);
        let tasks: Vec<(&Rule, &str)> = rulebook
            .rules
            .iter()
            .flat_map(|rule| {
                rulebook
                    .targets(rule)
                    .into_iter()
                    .map(move |spec| (rule, spec.alias.as_str()))
            })
            .collect();

        #[cfg(test)]
        let starting = |index: usize| {
            if self.cancel_from.is_some_and(|from| index >= from) {
                cancel.cancel();
            }
        };
        #[cfg(not(test))]
        let starting = |_: usize| {};

        let run = |(index, &(rule, alias)): (usize, &(&Rule, &str))| -> Option<RuleOutcome> {
            starting(index);
            if cancel.is_cancelled() {
                return None;
            }
            Some(evaluator.evaluate(rule, alias, documents))
        };

        let results: Vec<Option<RuleOutcome>> = if self.options.parallel {
            tasks.par_iter().enumerate().map(run).collect()
        } else {
            tasks.iter().enumerate().map(run).collect()
        };

        let total = results.len();
        let mut outcomes: Vec<RuleOutcome> = results.into_iter().flatten().collect();
        if outcomes.len() < total {
            let skipped = total - outcomes.len();
            warn!("Check cancelled with {} evaluation(s) unfinished", skipped);
            outcomes.push(RuleOutcome::cancelled(format!(
                "check cancelled; {} of {} evaluation(s) did not run",
                skipped, total
            )));
        }
        Report::new(outcomes)
    }

    fn abort(&mut self, err: ConfigMateError) -> Report {
        self.state = CheckState::Done;
        let outcome = match err {
            ConfigMateError::Cancelled => {
                warn!("Check cancelled while loading");
                RuleOutcome::cancelled(CANCELLED_WHILE_LOADING)
            }
            err if err.is_recoverable() => {
                warn!("Load failed: {}", err);
                RuleOutcome::load_error(&err)
            }
            err => {
                error!("Check aborted: {}", err);
                RuleOutcome::load_error(&err)
            }
        };
        Report::new(vec![outcome])
    }
}
