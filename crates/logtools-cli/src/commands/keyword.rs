//! Keyword command implementation.

use std::io::Write;

use logtools::LogTools;

use crate::cli::KeywordCommands;
use crate::error::CliError;
use crate::output::{KeywordList, Message, OutputFormat};

/// Handler for keyword subcommands.
pub struct KeywordCommand<'a> {
    tools: &'a LogTools,
}

impl<'a> KeywordCommand<'a> {
    /// Creates a new keyword command handler.
    #[must_use]
    pub const fn new(tools: &'a LogTools) -> Self {
        Self { tools }
    }

    /// Executes a keyword subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the keyword is unusable or output fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &KeywordCommands,
    ) -> Result<(), CliError> {
        match command {
            KeywordCommands::Add { keyword } => {
                if keyword.trim().is_empty() || keyword.contains(['\n', '\r']) {
                    return Err(CliError::InvalidArgument(
                        "keyword must be a single non-blank line".into(),
                    ));
                }
                let message = if self.tools.add_keyword(keyword) {
                    Message::success(format!("added keyword '{keyword}'"))
                } else {
                    Message::info(format!("keyword '{keyword}' already present"))
                };
                format.write(out, &message)
            }
            KeywordCommands::List => format.write(
                out,
                &KeywordList {
                    keywords: self.tools.keywords(),
                },
            ),
        }
    }
}
