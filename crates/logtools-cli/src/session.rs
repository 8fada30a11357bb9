//! Builds the logger a CLI invocation operates on.

use std::sync::Arc;

use logtools::{
    JsonFileSettings, LogTools, LogToolsConfig, MemorySettings, SettingsStore, KEY_FILTER_DIR,
    KEY_LOG_DIR,
};
use tracing::debug;

use crate::cli::Cli;
use crate::error::CliError;

/// Opens the logger described by the global options.
///
/// Directories given on the command line are written into the settings
/// store first, so they win over remembered values.
///
/// # Errors
///
/// Returns error if the settings file is unreadable or the logger fails to
/// start.
pub fn open_tools(cli: &Cli) -> Result<LogTools, CliError> {
    let settings: Arc<dyn SettingsStore> = match &cli.settings {
        Some(path) => Arc::new(JsonFileSettings::open(path).map_err(|e| {
            CliError::Config(format!("cannot load settings {}: {e}", path.display()))
        })?),
        None => Arc::new(MemorySettings::new()),
    };

    if let Some(dir) = &cli.log_dir {
        settings.put(KEY_LOG_DIR, &dir.to_string_lossy());
    }
    if let Some(dir) = &cli.filter_dir {
        settings.put(KEY_FILTER_DIR, &dir.to_string_lossy());
    }

    let config = match &cli.log_dir {
        Some(dir) => LogToolsConfig::new(dir),
        None => LogToolsConfig::default(),
    };
    debug!(log_dir = %config.log_dir.display(), "opening logger");
    Ok(LogTools::initialize(config, settings)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;
    use tempfile::TempDir;

    fn arg(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn command_line_directory_wins_over_settings() {
        let dir = TempDir::new().expect("temp dir");
        let settings = dir.path().join("settings.json");
        let stored = dir.path().join("stored");
        let explicit = dir.path().join("explicit");

        let json = JsonFileSettings::open(&settings).expect("settings");
        json.put(KEY_LOG_DIR, &stored.to_string_lossy());
        drop(json);

        let cli = Cli::parse_from(["logtools", "-s", &arg(&settings), "-l", &arg(&explicit), "files"]);
        let tools = open_tools(&cli).expect("open");
        assert_eq!(tools.log_directory(), explicit);
        assert_eq!(tools.filter_directory(), explicit.join("filter"));
        tools.shutdown();
    }

    #[test]
    fn remembered_directory_used_without_flag() {
        let dir = TempDir::new().expect("temp dir");
        let settings = dir.path().join("settings.json");
        let stored = dir.path().join("stored");

        let json = JsonFileSettings::open(&settings).expect("settings");
        json.put(KEY_LOG_DIR, &stored.to_string_lossy());
        json.put(KEY_FILTER_DIR, &stored.join("f").to_string_lossy());
        drop(json);

        let cli = Cli::parse_from(["logtools", "-s", &arg(&settings), "files"]);
        let tools = open_tools(&cli).expect("open");
        assert_eq!(tools.log_directory(), stored);
        tools.shutdown();
    }

    #[test]
    fn unreadable_settings_is_config_error() {
        let dir = TempDir::new().expect("temp dir");
        let settings = dir.path().join("settings.json");
        std::fs::write(&settings, "{broken").expect("seed");

        let cli = Cli::parse_from(["logtools", "-s", &arg(&settings), "files"]);
        assert!(matches!(open_tools(&cli), Err(CliError::Config(_))));
    }
}
