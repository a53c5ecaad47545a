//! CLI argument definitions for the gesture daemon.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// gestured: touchscreen gesture dispatcher with proximity confirmation.
#[derive(Parser, Debug)]
#[command(name = "gestured", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Override the proximity check timeout in milliseconds.
    #[arg(long = "proximity-timeout-ms")]
    pub proximity_timeout_ms: Option<u64>,

    /// Read input events from a file instead of stdin.
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > GESTURED_CONFIG env var > ~/.gestured/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("GESTURED_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level against the configured value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Resolve the proximity timeout against the configured value.
    pub fn resolve_proximity_timeout_ms(&self, config_timeout_ms: u64) -> u64 {
        self.proximity_timeout_ms.unwrap_or(config_timeout_ms)
    }
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".gestured").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "gestured",
            "-c",
            "/tmp/g.toml",
            "-l",
            "debug",
            "--proximity-timeout-ms",
            "500",
            "--input",
            "events.txt",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/g.toml"));
        assert_eq!(args.resolve_log_level("info"), "debug");
        assert_eq!(args.resolve_proximity_timeout_ms(3000), 500);
        assert_eq!(args.input, Some(PathBuf::from("events.txt")));
    }

    #[test]
    fn test_defaults_fall_back_to_config() {
        let args = CliArgs::parse_from(["gestured"]);
        assert_eq!(args.resolve_log_level("warn"), "warn");
        assert_eq!(args.resolve_proximity_timeout_ms(3000), 3000);
        assert!(args.input.is_none());
    }
}
