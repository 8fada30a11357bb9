//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use logtools::{BufferType, Level};

/// logtools - rotating file logger with keyword mirroring.
#[derive(Parser, Debug, Clone)]
#[command(name = "logtools")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Main log directory (overrides the stored setting).
    #[arg(short, long, env = "LOGTOOLS_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Filtered log directory (overrides the stored setting).
    #[arg(long, env = "LOGTOOLS_FILTER_DIR")]
    pub filter_dir: Option<PathBuf>,

    /// JSON settings file remembering directories and the file size cap.
    #[arg(short, long, env = "LOGTOOLS_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable output.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Append one entry to the log.
    Write(WriteArgs),

    /// Manage keywords mirrored into the filtered log.
    Keyword {
        /// Keyword subcommand to execute.
        #[command(subcommand)]
        command: KeywordCommands,
    },

    /// List main log files.
    Files,

    /// Run one retention sweep over the log directory.
    Sweep(SweepArgs),

    /// Print the sequence number the next line of a log file would carry.
    NextSeq {
        /// Log file to inspect.
        path: PathBuf,
    },
}

/// Arguments for `write`.
#[derive(Args, Debug, Clone)]
pub struct WriteArgs {
    /// Severity: v, d, i, w, e or f.
    #[arg(long, default_value = "i")]
    pub level: Level,

    /// Buffer the entry belongs to.
    #[arg(short, long, default_value = "MAIN")]
    pub buffer: BufferType,

    /// Tag written next to the message.
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Process id to record (defaults to this process).
    #[arg(short, long)]
    pub pid: Option<u32>,

    /// Only offer the entry to the keyword filter.
    #[arg(long)]
    pub no_persist: bool,

    /// Message text; words are joined with spaces.
    #[arg(required = true)]
    pub message: Vec<String>,
}

/// Keyword subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum KeywordCommands {
    /// Add a keyword.
    Add {
        /// Keyword to match in messages.
        keyword: String,
    },

    /// List keywords.
    List,
}

/// Arguments for `sweep`.
#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Total size cap in bytes.
    #[arg(long)]
    pub max_bytes: Option<u64>,

    /// File count cap.
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Fraction of the caps to clean down to.
    #[arg(long)]
    pub ratio: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_write() {
        let cli = Cli::parse_from([
            "logtools", "write", "--level", "warn", "-b", "system", "-t", "boot", "disk", "almost",
            "full",
        ]);
        let Commands::Write(args) = cli.command else {
            unreachable!("expected write");
        };
        assert_eq!(args.level, Level::W);
        assert_eq!(args.buffer, BufferType::System);
        assert_eq!(args.tag.as_deref(), Some("boot"));
        assert_eq!(args.message, vec!["disk", "almost", "full"]);
        assert!(!args.no_persist);
    }

    #[test]
    fn parse_write_defaults() {
        let cli = Cli::parse_from(["logtools", "write", "hello"]);
        let Commands::Write(args) = cli.command else {
            unreachable!("expected write");
        };
        assert_eq!(args.level, Level::I);
        assert_eq!(args.buffer, BufferType::Main);
        assert!(args.pid.is_none());
    }

    #[test]
    fn parse_write_requires_message() {
        assert!(Cli::try_parse_from(["logtools", "write"]).is_err());
    }

    #[test]
    fn parse_rejects_unknown_level() {
        assert!(Cli::try_parse_from(["logtools", "write", "--level", "loud", "x"]).is_err());
    }

    #[test]
    fn parse_keyword_add() {
        let cli = Cli::parse_from(["logtools", "keyword", "add", "timeout"]);
        assert!(matches!(
            cli.command,
            Commands::Keyword { command: KeywordCommands::Add { ref keyword } } if keyword == "timeout"
        ));
    }

    #[test]
    fn parse_global_options() {
        let cli = Cli::parse_from([
            "logtools", "-l", "/tmp/logs", "--filter-dir", "/tmp/f", "-f", "json", "files",
        ]);
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/logs")));
        assert_eq!(cli.filter_dir, Some(PathBuf::from("/tmp/f")));
        assert_eq!(cli.format, Format::Json);
        assert!(matches!(cli.command, Commands::Files));
    }

    #[test]
    fn parse_sweep_overrides() {
        let cli = Cli::parse_from(["logtools", "sweep", "--max-bytes", "1000", "--ratio", "0.5"]);
        let Commands::Sweep(args) = cli.command else {
            unreachable!("expected sweep");
        };
        assert_eq!(args.max_bytes, Some(1000));
        assert_eq!(args.max_files, None);
        assert_eq!(args.ratio, Some(0.5));
    }

    #[test]
    fn parse_next_seq() {
        let cli = Cli::parse_from(["logtools", "next-seq", "log_20240101_1.txt"]);
        assert!(matches!(cli.command, Commands::NextSeq { .. }));
    }
}
