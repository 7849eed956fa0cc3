//! Checks command implementation.
//!
//! The `configmate checks` command lists the functions rule checks can use.

use crate::error::Result;
use crate::rulebook::CHECK_FUNCTIONS;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The checks command implementation.
pub struct ChecksCommand;

impl Command for ChecksCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let width = CHECK_FUNCTIONS
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);
        let mut listing = String::new();
        for (name, summary) in CHECK_FUNCTIONS {
            listing.push_str(&format!("{:width$}  {}\n", name, summary, width = width));
        }
        ui.data(&listing);
        ui.message("Combine checks with &&, || and !, for example: string && nonempty");
        Ok(CommandResult::success())
    }
}
