//! # logtools-cli
//!
//! Command-line front end for the `logtools` logger.
//!
//! Provides commands for:
//! - Appending entries
//! - Managing mirrored keywords
//! - Listing log files
//! - Running a retention sweep on demand
//! - Inspecting the next sequence number of a file

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod session;

pub use cli::{Cli, Commands, Format, KeywordCommands, SweepArgs, WriteArgs};
pub use error::CliError;
pub use output::OutputFormat;
pub use session::open_tools;
