//! Files command implementation.

use std::io::Write;

use logtools::LogTools;

use crate::error::CliError;
use crate::output::{FileList, OutputFormat};

/// Handler for the files command.
pub struct FilesCommand<'a> {
    tools: &'a LogTools,
}

impl<'a> FilesCommand<'a> {
    /// Creates a new files command handler.
    #[must_use]
    pub const fn new(tools: &'a LogTools) -> Self {
        Self { tools }
    }

    /// Lists the main log files.
    ///
    /// # Errors
    ///
    /// Returns error if output fails.
    pub fn execute<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let list = FileList {
            directory: self.tools.log_directory(),
            files: self.tools.log_files(),
        };
        format.write(out, &list)
    }
}
