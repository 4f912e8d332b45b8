// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: Start the portal server (default)
//! - `validate`: Validate configuration file
//! - `version`: Show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use portal_config::{ConfigLoader, LogLevel, LoggingConfig};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// School portal identity service.
///
/// Links portal accounts to student and staff master records through
/// self-activation, reviewed claims, and single sign-on.
#[derive(Parser, Debug)]
#[command(
    name = "portal",
    author = "Sylvex <contact@sylvex.io>",
    version = portal_core::VERSION,
    about = "School portal identity service",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "portal.yaml",
        env = "PORTAL_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, env = "PORTAL_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, env = "PORTAL_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the portal server
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Parses and validates the configuration file without starting the server.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Override the configured listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// JSON file with master records and accounts to load at startup
    #[arg(long, env = "PORTAL_SEED")]
    pub seed: Option<PathBuf>,

    /// Enable development mode (ephemeral secret, relaxed session checks)
    #[arg(long, env = "PORTAL_DEV_MODE")]
    pub dev: bool,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<portal_config::LogFormat> for LogFormat {
    fn from(format: portal_config::LogFormat) -> Self {
        match format {
            portal_config::LogFormat::Text => LogFormat::Text,
            portal_config::LogFormat::Json => LogFormat::Json,
            portal_config::LogFormat::Compact => LogFormat::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Check if verbose logging is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Reads the `logging` section of the config file, if it parses.
    ///
    /// Logging starts before the command runs, so a broken file is not an
    /// error here; the command reports it.
    pub fn logging_from_config_file(&self) -> Option<LoggingConfig> {
        if !self.config.exists() {
            return None;
        }
        ConfigLoader::new()
            .load_unvalidated(&self.config)
            .ok()
            .map(|config| config.logging)
    }

    /// Get the effective log level: flags, then `--log-level`, then the
    /// config file, then `info`.
    pub fn effective_log_level(&self, file: Option<&LoggingConfig>) -> String {
        if self.quiet {
            return "warn".to_string();
        }
        if self.verbose {
            return "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            return level.clone();
        }
        file.map(|logging| logging.level)
            .unwrap_or(LogLevel::Info)
            .as_str()
            .to_string()
    }

    /// Get the effective log format: `--log-format`, then the config file.
    pub fn effective_log_format(&self, file: Option<&LoggingConfig>) -> LogFormat {
        self.log_format
            .or_else(|| file.map(|logging| logging.format.into()))
            .unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["portal"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Run(_)));
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["portal", "run", "--port", "9000", "--dev"]);
        if let Some(Commands::Run(args)) = cli.command {
            assert_eq!(args.port, Some(9000));
            assert!(args.dev);
            assert!(args.seed.is_none());
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_run_with_seed() {
        let cli = Cli::parse_from(["portal", "run", "--seed", "fixtures/school.json"]);
        if let Some(Commands::Run(args)) = cli.command {
            assert_eq!(args.seed, Some(PathBuf::from("fixtures/school.json")));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["portal", "validate", "--show-config", "--strict"]);
        if let Some(Commands::Validate(args)) = cli.command {
            assert!(args.show_config);
            assert!(args.strict);
            assert_eq!(args.format, OutputFormat::Text);
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["portal", "-c", "/etc/portal/config.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/portal/config.yaml"));
    }

    #[test]
    fn test_log_level_precedence() {
        let file = LoggingConfig {
            level: LogLevel::Error,
            format: portal_config::LogFormat::Json,
        };

        let cli = Cli::parse_from(["portal"]);
        assert_eq!(cli.effective_log_level(None), "info");
        assert_eq!(cli.effective_log_level(Some(&file)), "error");
        assert_eq!(cli.effective_log_format(Some(&file)), LogFormat::Json);

        let cli = Cli::parse_from(["portal", "-l", "trace", "--log-format", "compact"]);
        assert_eq!(cli.effective_log_level(Some(&file)), "trace");
        assert_eq!(cli.effective_log_format(Some(&file)), LogFormat::Compact);
    }

    #[test]
    fn test_quiet_mode() {
        let cli = Cli::parse_from(["portal", "-q", "-l", "debug"]);
        assert!(cli.quiet);
        assert!(!cli.is_verbose());
        assert_eq!(cli.effective_log_level(None), "warn");
    }

    #[test]
    fn test_verbose_mode() {
        let cli = Cli::parse_from(["portal", "-v"]);
        assert!(cli.is_verbose());
        assert_eq!(cli.effective_log_level(None), "debug");
    }

    #[test]
    fn test_missing_config_file_gives_no_logging_section() {
        let cli = Cli::parse_from(["portal", "-c", "/nonexistent/portal.yaml"]);
        assert!(cli.logging_from_config_file().is_none());
    }
}
