//! Tool settings.
//!
//! Settings come from `.configmate.yml` in the working directory, or from
//! the file named by `--settings`. Every field is optional:
//!
//! ```yaml
//! timeout_secs: 30
//! parallel: true
//! max_tokens: 1000
//! trace_rule_tokens: false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::check::{CheckOptions, EvalSettings, DEFAULT_MAX_TOKENS};
use crate::error::{ConfigMateError, Result};

/// Settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = ".configmate.yml";

/// Tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Seconds a whole check may take before it is cancelled.
    pub timeout_secs: u64,
    /// Load files and evaluate rules in parallel.
    pub parallel: bool,
    /// Maximum tokens in a single outcome.
    pub max_tokens: usize,
    /// Append each failing rule's own token to its outcome.
    pub trace_rule_tokens: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            parallel: true,
            max_tokens: DEFAULT_MAX_TOKENS,
            trace_rule_tokens: false,
        }
    }
}

impl Settings {
    /// Parse settings from YAML text. Blank text gives the defaults.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| ConfigMateError::SettingsParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load settings.
    ///
    /// An explicit path must exist. Without one, `.configmate.yml` in `dir`
    /// is used if present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(SETTINGS_FILE);
                if !candidate.is_file() {
                    debug!("No {} found, using default settings", SETTINGS_FILE);
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|e| ConfigMateError::SettingsParse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        debug!("Loaded settings from {}", path.display());
        Self::parse(&text, &path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Options for a check run.
    pub fn check_options(&self) -> CheckOptions {
        CheckOptions {
            parallel: self.parallel,
            eval: EvalSettings {
                trace_rule_tokens: self.trace_rule_tokens,
                max_tokens: self.max_tokens,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.parallel);
        assert_eq!(settings.max_tokens, 1000);
        assert!(!settings.trace_rule_tokens);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::parse("timeout_secs: 5\n", Path::new("s.yml")).unwrap();
        assert_eq!(settings.timeout(), Duration::from_secs(5));
        assert!(settings.parallel);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = Settings::parse("timeout: 5\n", Path::new("s.yml")).unwrap_err();
        assert!(matches!(err, ConfigMateError::SettingsParse { .. }));
    }

    #[test]
    fn missing_default_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load(None, temp.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn reads_file_from_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(SETTINGS_FILE),
            "parallel: false\ntrace_rule_tokens: true\n",
        )
        .unwrap();

        let options = Settings::load(None, temp.path()).unwrap().check_options();

        assert!(!options.parallel);
        assert!(options.eval.trace_rule_tokens);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yml");
        assert!(Settings::load(Some(&missing), temp.path()).is_err());
    }
}
