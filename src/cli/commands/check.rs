//! Check command implementation.
//!
//! The `configmate check` command runs a rulebook against the configuration
//! files it declares and prints the report.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::cancel::CancellationToken;
use crate::check::output::{HumanFormatter, JsonFormatter, OutputFormat, ReportFormatter};
use crate::check::{CheckOptions, Checker, Report};
use crate::cli::args::CheckArgs;
use crate::error::Result;
use crate::settings::Settings;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The check command implementation.
pub struct CheckCommand {
    working_dir: PathBuf,
    settings: Settings,
    args: CheckArgs,
}

impl CheckCommand {
    /// Create a new check command.
    pub fn new(working_dir: &Path, settings: Settings, args: CheckArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            settings,
            args,
        }
    }

    /// Settings merged with command-line overrides.
    fn options(&self) -> (CheckOptions, Duration) {
        let mut options = self.settings.check_options();
        if self.args.sequential {
            options.parallel = false;
        }
        if self.args.trace_rules {
            options.eval.trace_rule_tokens = true;
        }
        let timeout = self
            .args
            .timeout
            .map_or_else(|| self.settings.timeout(), Duration::from_secs);
        (options, timeout)
    }

    fn write_report<W: Write>(
        &self,
        report: &Report,
        ui: &dyn UserInterface,
        writer: &mut W,
    ) -> io::Result<()> {
        match self.args.format {
            OutputFormat::Json => JsonFormatter::new(true).format(report, writer),
            OutputFormat::Human => HumanFormatter::new(ui.uses_color())
                .show_passed(ui.output_mode().shows_passed())
                .format(report, writer),
        }
    }

    fn render(&self, report: &Report, ui: &dyn UserInterface) -> Result<String> {
        let mut output = Vec::new();
        self.write_report(report, ui, &mut output)?;
        Ok(String::from_utf8(output).map_err(anyhow::Error::from)?)
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let rulebook = self.working_dir.join(&self.args.rulebook);
        let (options, timeout) = self.options();
        debug!(
            "Check options: parallel = {}, timeout = {:?}",
            options.parallel, timeout
        );

        if self.args.format == OutputFormat::Human {
            ui.show_header(&format!("Checking {}", self.args.rulebook.display()));
        }

        let cancel = CancellationToken::with_timeout(timeout);
        let report = Checker::new(options).check_path(&rulebook, &cancel);
        let rendered = self.render(&report, ui)?;
        ui.data(&rendered);

        if report.was_cancelled() {
            ui.warning(&format!(
                "Check did not finish within {}s",
                timeout.as_secs()
            ));
        }

        if report.passed() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{MockUI, OutputMode};
    use std::fs;
    use tempfile::TempDir;

    const RULEBOOK: &str = "name: web
files:
  server: server.yaml
rules:
  - id: R1
    field: port
    type: int
    check: range(1, 65535)
";

    fn args(format: OutputFormat) -> CheckArgs {
        CheckArgs {
            rulebook: PathBuf::from("rules.yml"),
            format,
            timeout: None,
            sequential: false,
            trace_rules: false,
        }
    }

    fn project(server: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("rules.yml"), RULEBOOK).unwrap();
        fs::write(temp.path().join("server.yaml"), server).unwrap();
        temp
    }

    #[test]
    fn passing_check_succeeds() {
        let temp = project("port: 8080\n");
        let cmd = CheckCommand::new(temp.path(), Settings::default(), args(OutputFormat::Human));
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.data_output().contains("All 1 check(s) passed"));
        assert_eq!(ui.headers(), ["Checking rules.yml"]);
    }

    #[test]
    fn failing_check_exits_one() {
        let temp = project("port: \"abc\"\n");
        let cmd = CheckCommand::new(temp.path(), Settings::default(), args(OutputFormat::Human));
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.data_output().contains("failed[R1]"));
        assert!(ui.data_output().contains("server.yaml:1:7"));
    }

    #[test]
    fn verbose_mode_lists_passing_outcomes() {
        let temp = project("port: 8080\n");
        let cmd = CheckCommand::new(temp.path(), Settings::default(), args(OutputFormat::Human));
        let mut ui = MockUI::with_mode(OutputMode::Verbose);

        cmd.execute(&mut ui).unwrap();

        assert!(ui.data_output().contains("passed[R1]"));
    }

    #[test]
    fn json_output_is_response_array() {
        let temp = project("port: 0\n");
        let cmd = CheckCommand::new(temp.path(), Settings::default(), args(OutputFormat::Json));
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        let value: serde_json::Value = serde_json::from_str(ui.data_output()).unwrap();
        assert_eq!(value[0]["passed"], false);
        assert_eq!(value[0]["token_list"][0]["row"], 1);
        assert_eq!(value[0]["token_list"][0]["col"], 7);
        assert!(ui.headers().is_empty());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_are_returned() {
        let temp = TempDir::new().unwrap();
        let report = Report::new(Vec::new());
        let ui = MockUI::new();

        for format in [OutputFormat::Human, OutputFormat::Json] {
            let cmd = CheckCommand::new(temp.path(), Settings::default(), args(format));
            let err = cmd
                .write_report(&report, &ui, &mut ClosedPipe)
                .unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        }
    }

    #[test]
    fn flags_override_settings() {
        let temp = TempDir::new().unwrap();
        let cmd = CheckCommand::new(
            temp.path(),
            Settings::default(),
            CheckArgs {
                sequential: true,
                trace_rules: true,
                timeout: Some(3),
                ..args(OutputFormat::Human)
            },
        );

        let (options, timeout) = cmd.options();

        assert!(!options.parallel);
        assert!(options.eval.trace_rule_tokens);
        assert_eq!(timeout, Duration::from_secs(3));
    }
}
