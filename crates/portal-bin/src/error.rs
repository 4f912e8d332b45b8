// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the portal binary.
//!
//! Each failure class maps to its own process exit code so deployment
//! scripts can tell a bad config file from a port already in use.

use std::net::SocketAddr;

use thiserror::Error;

/// Result type alias for portal-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Failures of the `portal` command.
#[derive(Debug, Error)]
pub enum BinError {
    /// The command line and config file do not describe a runnable setup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The config file failed to load or validate.
    #[error(transparent)]
    Config(#[from] portal_config::ConfigError),

    /// The listen address is unavailable.
    #[error("Cannot listen on {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Socket error.
        #[source]
        source: std::io::Error,
    },

    /// The seed file is unreadable or inconsistent.
    #[error("Seed error: {0}")]
    Seed(String),

    /// Command output could not be rendered.
    #[error("Output error: {0}")]
    Output(String),

    /// The HTTP server failed to start or stopped with an error.
    #[error("Server error: {0}")]
    Api(#[from] portal_api::ApiError),

    /// A domain operation failed while preparing the runtime.
    #[error("Core error: {0}")]
    Core(#[from] portal_core::CoreError),

    /// Error annotated with what was being attempted.
    #[error("{context}: {source}")]
    WithContext {
        /// What was being attempted.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a seed error.
    pub fn seed(msg: impl Into<String>) -> Self {
        Self::Seed(msg.into())
    }

    /// Wraps a failed bind.
    pub fn bind(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Bind { addr, source }
    }

    /// Annotates the error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The config file error behind this error, if any.
    pub fn config_error(&self) -> Option<&portal_config::ConfigError> {
        match self {
            Self::Config(e) => Some(e),
            Self::WithContext { source, .. } => source.config_error(),
            _ => None,
        }
    }

    /// Process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Config(_) => 1,
            Self::Bind { .. } => 2,
            Self::Api(_) => 3,
            Self::Seed(_) => 4,
            Self::Core(_) => 5,
            Self::Output(_) => 6,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

/// Prints the error and its causes to stderr.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }

    if let Some(config_error) = error.config_error() {
        eprintln!("  {}", config_error.user_message());
    }
}

/// Prints the error and exits with its code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_message() {
        let err = BinError::config("No configuration provided");
        assert_eq!(err.to_string(), "Configuration error: No configuration provided");
    }

    #[test]
    fn test_context_keeps_exit_code() {
        let err = BinError::seed("unknown role 'x'").with_context("fixtures/school.json");
        assert_eq!(err.to_string(), "fixtures/school.json: Seed error: unknown role 'x'");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_bind_error() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let err = BinError::bind(
            addr,
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        );
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("127.0.0.1:8080"));
    }

    #[test]
    fn test_config_error_found_through_context() {
        let err = BinError::from(portal_config::ConfigError::missing_field("security.jwt.secret"))
            .with_context("Failed to load portal.yaml");
        assert!(err.config_error().is_some());
        assert!(BinError::seed("x").config_error().is_none());
    }

    #[test]
    fn test_domain_exit_codes() {
        assert_eq!(BinError::from(portal_core::CoreError::no_match()).exit_code(), 5);
        assert_eq!(BinError::Output("x".into()).exit_code(), 6);
    }
}
