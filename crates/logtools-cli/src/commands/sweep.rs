//! Sweep command implementation.

use std::io::Write;

use logtools::LogTools;
use tracing::debug;

use crate::cli::SweepArgs;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Handler for the sweep command.
pub struct SweepCommand<'a> {
    tools: &'a LogTools,
}

impl<'a> SweepCommand<'a> {
    /// Creates a new sweep command handler.
    #[must_use]
    pub const fn new(tools: &'a LogTools) -> Self {
        Self { tools }
    }

    /// Applies any cap overrides and sweeps the log directory once.
    ///
    /// # Errors
    ///
    /// Returns error if an override is out of range or output fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &SweepArgs,
    ) -> Result<(), CliError> {
        if let Some(bytes) = args.max_bytes {
            self.tools.set_max_folder_size(bytes)?;
        }
        if let Some(count) = args.max_files {
            self.tools.set_max_file_count(count)?;
        }
        if let Some(ratio) = args.ratio {
            self.tools.set_clean_target_ratio(ratio)?;
        }
        debug!(summary = %self.tools.config_summary(), "sweeping");

        let report = self.tools.sweep_now();
        format.write(out, &report)
    }
}
