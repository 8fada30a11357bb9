//! Next-seq command implementation.

use std::io::Write;
use std::path::Path;

use logtools::next_sequence;

use crate::error::CliError;
use crate::output::{NextSequence, OutputFormat};

/// Handler for the next-seq command.
#[derive(Debug, Clone, Copy, Default)]
pub struct NextSeqCommand;

impl NextSeqCommand {
    /// Prints the next sequence number for `path`.
    ///
    /// A missing file yields 1.
    ///
    /// # Errors
    ///
    /// Returns error if `path` is a directory or output fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        path: &Path,
    ) -> Result<(), CliError> {
        if path.is_dir() {
            return Err(CliError::InvalidArgument(format!(
                "{} is a directory",
                path.display()
            )));
        }
        let next = NextSequence {
            path: path.to_path_buf(),
            next: next_sequence(path),
        };
        format.write(out, &next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn prints_next_sequence() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("log_20240101_1.txt");
        fs::write(&path, "<7> a\n<8> b\n").expect("seed");

        let mut out = Vec::new();
        NextSeqCommand
            .execute(&mut out, &OutputFormat::default(), &path)
            .expect("execute");
        assert_eq!(String::from_utf8(out).expect("utf8"), "9\n");
    }

    #[test]
    fn rejects_directory() {
        let dir = TempDir::new().expect("temp dir");
        let result = NextSeqCommand.execute(&mut Vec::new(), &OutputFormat::default(), dir.path());
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    }
}
