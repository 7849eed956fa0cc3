//! Init command implementation.
//!
//! The `configmate init` command writes a starter rulebook declaring the
//! given configuration files, with one example rule per file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::args::InitArgs;
use crate::config::{load_config_file, ConfigValue, NodePath};
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The init command implementation.
pub struct InitCommand {
    working_dir: PathBuf,
    args: InitArgs,
}

/// A file declared in the generated rulebook.
struct Declared {
    alias: String,
    path: String,
    rule: String,
}

impl InitCommand {
    /// Create a new init command.
    pub fn new(working_dir: &Path, args: InitArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            args,
        }
    }

    fn target(&self) -> PathBuf {
        self.working_dir.join(&self.args.path)
    }

    /// Create rulebook content for the declared files.
    fn create_rulebook(&self) -> String {
        let target = self.target();
        let name = target
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("rulebook");
        let rulebook_dir = target.parent().unwrap_or(self.working_dir.as_path());

        let mut aliases: Vec<String> = Vec::new();
        let declared: Vec<Declared> = self
            .args
            .files
            .iter()
            .map(|file| {
                let alias = unique_alias(file, &aliases);
                aliases.push(alias.clone());
                let resolved = self.working_dir.join(file);
                let path = resolved
                    .strip_prefix(rulebook_dir)
                    .unwrap_or(&resolved)
                    .display()
                    .to_string();
                let rule = example_rule(&alias, &resolved);
                Declared { alias, path, rule }
            })
            .collect();

        let mut content = format!(
            "# ConfigMate rulebook\n\
             # Run it with: configmate check {}\n\
             # List check functions with: configmate checks\n\
             name: {}\n",
            self.args.path.display(),
            yaml_quote(name)
        );

        if declared.is_empty() {
            content.push_str("files: {}\nrules: []\n");
            return content;
        }

        content.push_str("files:\n");
        for file in &declared {
            content.push_str(&format!("  {}: {}\n", file.alias, yaml_quote(&file.path)));
        }
        content.push_str("rules:\n");
        for file in &declared {
            content.push_str(&file.rule);
        }
        content
    }
}

/// Alias from the file stem, made safe as a YAML key and unique.
fn unique_alias(file: &Path, taken: &[String]) -> String {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("config")
        .trim_start_matches('.');
    let mut base: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if base.is_empty() {
        base = "config".to_string();
    }

    let mut alias = base.clone();
    let mut n = 2;
    while taken.contains(&alias) {
        alias = format!("{}_{}", base, n);
        n += 1;
    }
    alias
}

/// An example rule: the first top-level key and its current type when the
/// file can be read, otherwise an optional placeholder.
fn example_rule(alias: &str, path: &Path) -> String {
    let first = load_config_file(path).ok().and_then(|doc| {
        doc.root.entries().first().map(|entry| {
            let field = NodePath::from_keys([entry.key.as_str()]).to_string();
            (field, type_name(&entry.value.value))
        })
    });

    match first {
        Some((field, value_type)) => format!(
            "  - id: {alias}-shape\n    file: {alias}\n    field: {}\n    type: {value_type}\n",
            yaml_quote(&field)
        ),
        None => {
            debug!("No example field found in {}", path.display());
            format!(
                "  - id: {alias}-version\n    file: {alias}\n    field: version\n    check: nonempty\n    optional: true\n"
            )
        }
    }
}

fn type_name(value: &ConfigValue) -> &'static str {
    match value {
        ConfigValue::Null => "null",
        ConfigValue::Bool(_) => "bool",
        ConfigValue::Integer(_) => "int",
        ConfigValue::Float(_) => "float",
        ConfigValue::String(_) => "string",
        ConfigValue::Sequence(_) => "list",
        ConfigValue::Mapping(_) => "map",
    }
}

/// Single-quote `text` for YAML when it is not a plain word.
fn yaml_quote(text: &str) -> String {
    let plain = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'));
    let keyword = matches!(
        text.to_ascii_lowercase().as_str(),
        "true" | "false" | "null" | "yes" | "no" | "on" | "off"
    );
    if plain && !keyword && text.parse::<f64>().is_err() {
        text.to_string()
    } else {
        format!("'{}'", text.replace('\'', "''"))
    }
}

impl Command for InitCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let target = self.target();
        if target.exists() && !self.args.force {
            ui.error(&format!(
                "{} already exists. Use --force to overwrite.",
                self.args.path.display()
            ));
            return Ok(CommandResult::failure(1));
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, self.create_rulebook())?;

        ui.success(&format!("Created {}", self.args.path.display()));
        ui.message(&format!(
            "Next: configmate check {}",
            self.args.path.display()
        ));
        Ok(CommandResult::success())
    }
}
