// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # portal-config
//!
//! Configuration management for the school portal.
//!
//! ## Features
//!
//! - **Schema Definition**: typed sections with defaults and validation
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Environment Overrides**: `PORTAL_*` variables and `${VAR:default}` placeholders
//! - **Secret Handling**: secrets never appear in `Debug` or `Display` output
//!
//! ## Quick Start
//!
//! ```no_run
//! use portal_config::loader::load_config;
//!
//! let config = load_config("portal.yaml").unwrap();
//! println!("Listening on {}", config.server.socket_addr());
//! ```
//!
//! ## Configuration Schema
//!
//! - `server` - bind address, port, environment, CORS
//! - `security` - session tokens, rate limiting, audit trail
//! - `sso` - federated identity provider and key set
//! - `ai` - generative-content upstream
//! - `matching` - identifier length thresholds
//! - `logging` - level and format
//!
//! Values in config files can reference environment variables:
//!
//! ```yaml
//! security:
//!   jwt:
//!     secret: "${PORTAL_SESSION_SECRET}"
//! ai:
//!   upstream_url: "${AI_UPSTREAM:https://generativelanguage.googleapis.com/v1beta}"
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod loader;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, ConfigFormat, ConfigLoader};
pub use schema::{
    AiConfig, AuditConfig, CorsConfig, Environment, JwtConfig, LogFormat, LogLevel,
    LoggingConfig, MatchingConfig, PortalConfig, RateLimitConfig, SecretValue, SecurityConfig,
    ServerConfig, SsoConfig,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// =============================================================================
// Prelude
// =============================================================================

/// Convenience re-exports for common use cases.
pub mod prelude {
    pub use crate::error::{ConfigError, ConfigResult};
    pub use crate::loader::{load_config, ConfigLoader};
    pub use crate::schema::{Environment, PortalConfig, SecretValue};
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "portal-config");
    }

    #[test]
    fn test_prelude_imports() {
        use prelude::*;
        let config = PortalConfig::default();
        assert_eq!(config.server.environment, Environment::Production);
    }
}
