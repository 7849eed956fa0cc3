//! Configuration format families.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The syntax family a configuration file is read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFormat {
    /// YAML documents (`.yaml`, `.yml`).
    Yaml,
    /// JSON documents (`.json`).
    Json,
    /// Line-based `key = value` files (`.env`, `.ini`, `.properties`).
    KeyValue,
}

impl ConfigFormat {
    /// Infer the format from a file extension.
    ///
    /// Dotfiles named `.env` (or `.env.local` and friends) are key-value files.
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        if file_name == ".env" || file_name.starts_with(".env.") {
            return Some(Self::KeyValue);
        }
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "env" | "ini" | "properties" | "conf" | "cfg" => Some(Self::KeyValue),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::KeyValue => "keyvalue",
        }
    }
}

impl FromStr for ConfigFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "env" | "ini" | "properties" | "keyvalue" | "key-value" => Ok(Self::KeyValue),
            _ => Err(format!("unknown config format: {}", s)),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
