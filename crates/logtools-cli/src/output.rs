//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;
use std::path::PathBuf;

use logtools::SweepReport;
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Log files in one directory.
#[derive(Debug, Clone, Serialize)]
pub struct FileList {
    /// Directory that was listed.
    pub directory: PathBuf,
    /// File names, sorted.
    pub files: Vec<String>,
}

impl TableDisplay for FileList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.files.is_empty() {
            writeln!(writer, "No log files in {}", self.directory.display())?;
            return Ok(());
        }
        writeln!(writer, "{} ({} files)", self.directory.display(), self.files.len())?;
        for name in &self.files {
            writeln!(writer, "  {name}")?;
        }
        Ok(())
    }
}

/// Configured keywords.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordList {
    /// Keywords in insertion order.
    pub keywords: Vec<String>,
}

impl TableDisplay for KeywordList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.keywords.is_empty() {
            writeln!(writer, "No keywords configured")?;
            return Ok(());
        }
        for keyword in &self.keywords {
            writeln!(writer, "{keyword}")?;
        }
        Ok(())
    }
}

impl TableDisplay for SweepReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Retention Sweep")?;
        writeln!(writer, "═══════════════")?;
        writeln!(
            writer,
            "Scanned:   {} files, {}",
            self.scanned_files,
            format_bytes(self.scanned_bytes)
        )?;
        writeln!(
            writer,
            "Deleted:   {} files, {}",
            self.deleted_files,
            format_bytes(self.deleted_bytes)
        )?;
        if self.failed_deletes > 0 {
            writeln!(writer, "Failed:    {}", self.failed_deletes)?;
        }
        if self.skipped_active > 0 {
            writeln!(writer, "In use:    {}", self.skipped_active)?;
        }
        if self.removed_dirs > 0 {
            writeln!(writer, "Dirs gone: {}", self.removed_dirs)?;
        }
        Ok(())
    }
}

/// Next sequence number for a file.
#[derive(Debug, Clone, Serialize)]
pub struct NextSequence {
    /// Inspected file.
    pub path: PathBuf,
    /// Sequence the next appended line would carry.
    pub next: u64,
}

impl TableDisplay for NextSequence {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.next)?;
        Ok(())
    }
}

/// Simple message output.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
    /// Whether this is a success message.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// Create an informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.success {
            writeln!(writer, "✓ {}", self.message)?;
        } else {
            writeln!(writer, "{}", self.message)?;
        }
        Ok(())
    }
}

/// Renders a byte count with a binary unit.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_default_is_table() {
        let fmt = OutputFormat::default();
        assert_eq!(fmt.format(), Format::Table);
        assert!(!fmt.is_json());
    }

    #[test]
    fn file_list_table_output() {
        let list = FileList {
            directory: PathBuf::from("/var/log/app"),
            files: vec!["log_20240101_1.txt".into(), "log_20240101_2.txt".into()],
        };
        let output = OutputFormat::default().to_string(&list).expect("should format");

        assert!(output.starts_with("/var/log/app (2 files)"));
        assert!(output.contains("  log_20240101_2.txt"));
    }

    #[test]
    fn empty_file_list() {
        let list = FileList {
            directory: PathBuf::from("logs"),
            files: Vec::new(),
        };
        let output = OutputFormat::default().to_string(&list).expect("should format");
        assert_eq!(output, "No log files in logs\n");
    }

    #[test]
    fn sweep_report_table_output() {
        let report = SweepReport {
            scanned_files: 5,
            scanned_bytes: 1500,
            deleted_files: 3,
            deleted_bytes: 900,
            ..SweepReport::default()
        };
        let output = OutputFormat::default().to_string(&report).expect("should format");

        assert!(output.contains("Scanned:   5 files, 1.5 KiB"));
        assert!(output.contains("Deleted:   3 files, 900 B"));
        assert!(!output.contains("Failed"));
    }

    #[test]
    fn sweep_report_json_output() {
        let report = SweepReport {
            deleted_files: 2,
            ..SweepReport::default()
        };
        let output = OutputFormat::new(Format::Json)
            .to_string(&report)
            .expect("should format");
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(parsed["deleted_files"], 2);
    }

    #[test]
    fn next_sequence_prints_bare_number() {
        let next = NextSequence {
            path: PathBuf::from("log_20240101_1.txt"),
            next: 42,
        };
        assert_eq!(OutputFormat::default().to_string(&next).expect("format"), "42\n");
    }

    #[test]
    fn message_success() {
        let msg = Message::success("keyword added");
        let output = OutputFormat::default().to_string(&msg).expect("should format");
        assert!(output.contains("✓ keyword added"));
    }

    #[test]
    fn message_info() {
        let msg = Message::info("keyword already present");
        let output = OutputFormat::default().to_string(&msg).expect("should format");
        assert!(!output.contains("✓"));
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10.0 MiB");
    }
}
