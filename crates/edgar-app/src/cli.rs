//! CLI argument definitions for the Edgar terminal chat.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Edgar: a rule-based conversational assistant for the terminal.
#[derive(Parser, Debug)]
#[command(name = "edgar", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Model to load from the models directory (file name without `.json`).
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Directory holding model JSON files.
    #[arg(short = 'd', long = "models-dir")]
    pub models_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Print answers at once instead of pacing them.
    #[arg(long = "no-stream")]
    pub no_stream: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > EDGAR_CONFIG env var > platform default (~/.edgar/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("EDGAR_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the model name.
    ///
    /// Priority: --model flag > EDGAR_MODEL env var > config file value.
    pub fn resolve_model(&self, config_model: &str) -> String {
        if let Some(ref m) = self.model {
            return m.clone();
        }
        match std::env::var("EDGAR_MODEL") {
            Ok(m) if !m.trim().is_empty() => m,
            _ => config_model.to_string(),
        }
    }

    /// Resolve the models directory.
    ///
    /// Returns `None` if not overridden (use config value).
    pub fn resolve_models_dir(&self) -> Option<String> {
        self.models_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log filter directive.
    ///
    /// Priority: --log-level flag > RUST_LOG > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        match std::env::var("RUST_LOG") {
            Ok(filter) if !filter.trim().is_empty() => filter,
            _ => config_level.to_string(),
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".edgar").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".edgar").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let args = CliArgs::parse_from([
            "edgar",
            "--config",
            "/tmp/edgar.toml",
            "-m",
            "science",
            "--models-dir",
            "/srv/models",
            "--no-stream",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/edgar.toml"));
        assert_eq!(args.resolve_model("edgar"), "science");
        assert_eq!(args.resolve_models_dir().as_deref(), Some("/srv/models"));
        assert!(args.no_stream);
    }

    #[test]
    fn test_log_level_flag_wins() {
        let args = CliArgs::parse_from(["edgar", "--log-level", "debug"]);
        assert_eq!(args.resolve_log_level("warn"), "debug");
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["edgar"]);
        assert!(args.resolve_models_dir().is_none());
        assert!(!args.no_stream);
    }
}
