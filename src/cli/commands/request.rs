//! Request command implementation.
//!
//! The `configmate request` command answers one request body read from
//! stdin, exactly as a service wrapping [`crate::api::handle`] would.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{handle, ApiOptions, ApiResponse};
use crate::cli::args::RequestArgs;
use crate::error::Result;
use crate::settings::Settings;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The request command implementation.
pub struct RequestCommand {
    working_dir: PathBuf,
    settings: Settings,
    args: RequestArgs,
    body: String,
}

impl RequestCommand {
    /// Create a new request command for an already read body.
    pub fn new(working_dir: &Path, settings: Settings, args: RequestArgs, body: String) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            settings,
            args,
            body,
        }
    }

    fn api_options(&self) -> ApiOptions {
        let timeout = self
            .args
            .timeout
            .map_or_else(|| self.settings.timeout(), Duration::from_secs);
        ApiOptions {
            check: self.settings.check_options(),
            timeout: Some(timeout),
            base_dir: self.working_dir.clone(),
        }
    }
}

impl Command for RequestCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let response = handle(&self.args.method, &self.body, &self.api_options());
        ui.data(&format!("{}\n", response.body()));

        match response {
            ApiResponse::Report(_) => Ok(CommandResult::success()),
            ApiResponse::Rejected { status, message } => {
                ui.error(&format!("Request rejected ({}): {}", status, message));
                Ok(CommandResult::failure(2))
            }
        }
    }
}
