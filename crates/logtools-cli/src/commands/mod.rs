//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`write`] - Append an entry
//! - [`keyword`] - Keyword management
//! - [`files`] - Log file listing
//! - [`sweep`] - One-off retention sweep
//! - [`next_seq`] - Sequence recovery for a single file

pub mod files;
pub mod keyword;
pub mod next_seq;
pub mod sweep;
pub mod write;

pub use files::FilesCommand;
pub use keyword::KeywordCommand;
pub use next_seq::NextSeqCommand;
pub use sweep::SweepCommand;
pub use write::WriteCommand;
