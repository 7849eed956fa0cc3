//! Configuration file loading.
//!
//! Reading is separated from parsing through [`FileSource`] so checks can run
//! against the filesystem or against in-memory fixtures.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use super::format::ConfigFormat;
use super::json::parse_json;
use super::keyvalue::parse_key_value;
use super::node::ConfigDocument;
use super::yaml::parse_yaml;
use crate::cancel::CancellationToken;
use crate::error::{ConfigMateError, Result};
use crate::token::Token;

/// How often a blocked read re-checks for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Somewhere configuration text can be read from.
pub trait FileSource: Send + Sync {
    /// Read the whole file at `path`.
    ///
    /// Returns `FileNotFound` for missing files and `Cancelled` if `cancel`
    /// fires before the read completes.
    fn read(&self, path: &Path, cancel: &CancellationToken) -> Result<String>;
}

/// Reads from the local filesystem.
///
/// Each read runs on a helper thread so a slow disk or network mount cannot
/// hold a check past its deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl FileSource for FsSource {
    fn read(&self, path: &Path, cancel: &CancellationToken) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(ConfigMateError::Cancelled);
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        let owned = path.to_path_buf();
        thread::spawn(move || {
            let _ = tx.send(std::fs::read_to_string(&owned));
        });

        loop {
            let wait = cancel
                .remaining()
                .map_or(POLL_INTERVAL, |left| left.min(POLL_INTERVAL));
            match rx.recv_timeout(wait) {
                Ok(result) => return result.map_err(|e| read_error(e, path)),
                Err(RecvTimeoutError::Timeout) => {
                    if cancel.is_cancelled() {
                        return Err(ConfigMateError::Cancelled);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ConfigMateError::Other(anyhow::anyhow!(
                        "reader for {} exited without a result",
                        path.display()
                    )))
                }
            }
        }
    }
}

fn read_error(e: std::io::Error, path: &Path) -> ConfigMateError {
    match e.kind() {
        ErrorKind::NotFound => ConfigMateError::FileNotFound {
            path: path.to_path_buf(),
            token: Token::file_start(path),
        },
        ErrorKind::InvalidData => ConfigMateError::Parse {
            message: "file is not valid UTF-8".to_string(),
            token: Token::file_start(path),
        },
        _ => ConfigMateError::Io(e),
    }
}

/// In-memory files, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<PathBuf, String>,
}

impl MemorySource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl FileSource for MemorySource {
    fn read(&self, path: &Path, cancel: &CancellationToken) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(ConfigMateError::Cancelled);
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ConfigMateError::FileNotFound {
                path: path.to_path_buf(),
                token: Token::file_start(path),
            })
    }
}

/// Resolve the format for `path`, preferring an explicit one.
pub fn resolve_format(path: &Path, explicit: Option<ConfigFormat>) -> Result<ConfigFormat> {
    explicit
        .or_else(|| ConfigFormat::from_path(path))
        .ok_or_else(|| ConfigMateError::Parse {
            message: format!(
                "cannot tell the format of {} from its name; declare a format for it",
                path.display()
            ),
            token: Token::file_start(path),
        })
}

/// Parse configuration text in a known format.
///
/// # Arguments
///
/// * `content` - The file content
/// * `path` - Path recorded in every token
/// * `format` - Syntax family to read it with
pub fn parse_config(content: &str, path: &Path, format: ConfigFormat) -> Result<ConfigDocument> {
    let root = match format {
        ConfigFormat::Yaml => parse_yaml(content, path)?,
        ConfigFormat::Json => parse_json(content, path)?,
        ConfigFormat::KeyValue => parse_key_value(content, path)?,
    };
    Ok(ConfigDocument::new(path, format, root))
}

/// Read and parse one configuration file through `source`.
///
/// # Errors
///
/// Returns `FileNotFound` if the file doesn't exist.
/// Returns `Parse` if the content is invalid or the format is unknown.
/// Returns `Cancelled` if `cancel` fires while reading.
pub fn load_config(
    source: &dyn FileSource,
    path: &Path,
    format: Option<ConfigFormat>,
    cancel: &CancellationToken,
) -> Result<ConfigDocument> {
    let format = resolve_format(path, format)?;
    let content = source.read(path, cancel)?;
    parse_config(&content, path, format)
}

/// Load a single file from disk with its format inferred from the name.
pub fn load_config_file(path: &Path) -> Result<ConfigDocument> {
    load_config(&FsSource, path, None, &CancellationToken::new())
}
