//! Write command implementation.

use std::io::Write;

use logtools::{LogTools, WriteOptions};

use crate::cli::WriteArgs;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// Handler for the write command.
pub struct WriteCommand<'a> {
    tools: &'a LogTools,
}

impl<'a> WriteCommand<'a> {
    /// Creates a new write command handler.
    #[must_use]
    pub const fn new(tools: &'a LogTools) -> Self {
        Self { tools }
    }

    /// Appends the entry and waits until it is on disk.
    ///
    /// # Errors
    ///
    /// Returns error if the logger has shut down or output fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &WriteArgs,
    ) -> Result<(), CliError> {
        let message = args.message.join(" ");
        if message.trim().is_empty() {
            return Err(CliError::InvalidArgument("message must not be empty".into()));
        }

        let options = WriteOptions::new().with_persist(!args.no_persist);
        self.tools.write(
            args.level,
            args.buffer,
            args.pid.unwrap_or_else(std::process::id),
            args.tag.as_deref(),
            &message,
            options,
        )?;
        self.tools.flush()?;

        let target = if args.no_persist {
            "keyword filter".to_string()
        } else {
            self.tools
                .current_log_file()
                .map_or_else(|| "log".to_string(), |p| p.display().to_string())
        };
        format.write(out, &Message::success(format!("wrote entry to {target}")))
    }
}
